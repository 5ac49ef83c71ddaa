//! Client-side session state.
//!
//! ARCHITECTURE
//! ============
//! [`SessionContext`] owns one [`TokenStore`] and is passed explicitly to
//! every consumer. [`AuthHook`] gives components a one-shot snapshot;
//! [`AccessGuard`] validates remotely before protected content renders.

pub mod context;
pub mod guard;
pub mod hook;
pub mod store;

pub use context::SessionContext;
pub use guard::{AccessGuard, GuardOptions, GuardState, Navigator, Screen};
pub use hook::{AuthHook, AuthState};
pub use store::{Session, TokenStore, Validation};
