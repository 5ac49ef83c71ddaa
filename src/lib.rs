//! Route-access gate for the fintrack dashboard.
//!
//! ARCHITECTURE
//! ============
//! - [`access`]: edge middleware classifying page paths and redirecting on
//!   cookie presence.
//! - [`backend`]: the external WordPress JWT issuer behind a trait.
//! - [`session`]: client-side token store, auth hook, and access guard.
//! - [`routes`]: axum router with the auth API and the gated page service.

pub mod access;
pub mod backend;
pub mod config;
pub mod routes;
pub mod session;
pub mod state;
