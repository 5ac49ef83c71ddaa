//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! API routes are dispatched directly and never see the access middleware.
//! Everything else falls through to the static page service, which is wrapped
//! by [`crate::access::route_access`]. That split is what keeps JSON calls
//! from ever being answered with a login redirect.

pub mod auth;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::access::route_access;
use crate::state::AppState;

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/validate", post(auth::validate))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Static pages behind the access gate. Unknown paths get the SPA shell.
fn page_routes(state: &AppState) -> Router {
    let public_dir = &state.config.public_dir;
    let pages = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(public_dir.join("index.html")));

    Router::new()
        .fallback_service(pages)
        .layer(middleware::from_fn_with_state(Arc::clone(&state.routes), route_access))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let pages = page_routes(&state);
    api_routes(state)
        .merge(pages)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
