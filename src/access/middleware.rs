//! Edge route-access middleware.
//!
//! Runs before any page is served. Only cookie *presence* is checked; token
//! validity is the access guard's job. The middleware never touches the
//! network.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::table::{RouteClass, RouteTable};
use super::{DASHBOARD_PATH, LOGIN_PATH, SESSION_COOKIE};

/// Outcome of evaluating one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Pass,
    RedirectToLogin { location: String },
    RedirectToDashboard,
}

/// Decide what to do with `path` given whether a session cookie is present.
#[must_use]
pub fn decide(table: &RouteTable, path: &str, has_session: bool) -> Decision {
    match table.classify(path) {
        RouteClass::AlwaysPublic | RouteClass::Unclassified => Decision::Pass,
        RouteClass::Protected if !has_session => Decision::RedirectToLogin { location: login_redirect_location(path) },
        RouteClass::PublicOnly if has_session => Decision::RedirectToDashboard,
        RouteClass::Protected | RouteClass::PublicOnly => Decision::Pass,
    }
}

/// `/login?redirect=<percent-encoded path>`.
#[must_use]
pub fn login_redirect_location(path: &str) -> String {
    format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(path))
}

/// Extract a well-formed session token from the cookie jar.
///
/// Empty values and values with whitespace or control bytes count as absent.
#[must_use]
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| is_well_formed_token(value))
}

pub(crate) fn is_well_formed_token(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_graphic())
}

/// Axum middleware applying [`decide`] to every non-excluded request.
pub async fn route_access(
    State(table): State<Arc<RouteTable>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if table.is_excluded(&path) {
        return next.run(request).await;
    }

    let has_session = session_token(&jar).is_some();
    match decide(&table, &path, has_session) {
        Decision::Pass => next.run(request).await,
        Decision::RedirectToLogin { location } => {
            tracing::debug!(
                %path,
                class = RouteClass::Protected.as_str(),
                "no session cookie, redirecting to login"
            );
            Redirect::temporary(&location).into_response()
        }
        Decision::RedirectToDashboard => {
            tracing::debug!(
                %path,
                class = RouteClass::PublicOnly.as_str(),
                "session cookie present, redirecting to dashboard"
            );
            Redirect::temporary(DASHBOARD_PATH).into_response()
        }
    }
}

#[cfg(test)]
#[path = "middleware_test.rs"]
mod tests;
