//! Route access control at the HTTP edge.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page request passes through [`middleware::route_access`] before the
//! static page service sees it. API routes and static assets are excluded by
//! the route table, so JSON calls are never answered with a redirect.

pub mod middleware;
pub mod table;

pub use middleware::{Decision, decide, route_access, session_token};
pub use table::{RouteClass, RouteTable};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "auth-token";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
