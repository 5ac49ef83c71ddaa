//! Auth routes: login exchange, logout, current user, token validation.
//!
//! These are the server half of the token lifecycle. They are API routes and
//! therefore never pass through the edge access middleware.

use axum::extract::{FromRequestParts, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::access::middleware::is_well_formed_token;
use crate::access::{SESSION_COOKIE, session_token};
use crate::backend::{BackendError, UserIdentity};
use crate::config::GateConfig;
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Session token taken from the `auth-token` cookie, or failing that from an
/// `Authorization: Bearer` header. Use as a handler parameter to require one.
pub struct AuthToken(pub String);

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_headers(&parts.headers)
            .map(Self)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

pub(crate) fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(token) = session_token(&jar) {
        return Some(token.to_owned());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| is_well_formed_token(t))
        .map(str::to_owned)
}

// =============================================================================
// COOKIES
// =============================================================================

fn session_cookie(config: &GateConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(config.session_max_age_secs))
        .build()
}

fn cleared_session_cookie(config: &GateConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// ERRORS
// =============================================================================

pub(crate) fn backend_error_to_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Rejected { .. } => StatusCode::UNAUTHORIZED,
        BackendError::Request(_) | BackendError::Parse(_) | BackendError::HttpClientBuild(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    user: UserIdentity,
}

/// `POST /api/auth/login`: exchange credentials, set the session cookie.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginRequest>) -> Response {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "username and password are required");
    }

    match state.backend.issue_token(username, &body.password).await {
        Ok(grant) => {
            tracing::info!(%username, "login succeeded");
            let jar = jar.add(session_cookie(&state.config, grant.token.clone()));
            (jar, Json(LoginResponse { token: grant.token, user: grant.user })).into_response()
        }
        Err(e) => {
            let status = backend_error_to_status(&e);
            if status == StatusCode::UNAUTHORIZED {
                tracing::info!(%username, error = %e, "login rejected");
                error_response(status, "invalid username or password")
            } else {
                tracing::error!(%username, error = %e, "login exchange failed");
                error_response(status, "authentication service unavailable")
            }
        }
    }
}

/// `POST /api/auth/logout`: expire the session cookie. WordPress JWTs are
/// stateless, so the backend is not told.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (jar.add(cleared_session_cookie(&state.config)), StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: identity behind the current token.
pub async fn me(State(state): State<AppState>, AuthToken(token): AuthToken) -> Response {
    match state.backend.current_user(&token).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => {
            let status = backend_error_to_status(&e);
            tracing::warn!(error = %e, %status, "current user lookup failed");
            error_response(status, "authentication required")
        }
    }
}

/// `POST /api/auth/validate`: fail-closed token check.
pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
    let invalid = || (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "valid": false })));

    let Some(token) = token_from_headers(&headers) else {
        return invalid();
    };

    match tokio::time::timeout(state.config.validation_timeout, state.backend.validate_token(&token)).await {
        Ok(Ok(())) => (StatusCode::OK, Json(serde_json::json!({ "valid": true }))),
        Ok(Err(e)) => {
            if e.is_unreachable() {
                tracing::warn!(error = %e, "validation backend unreachable");
            }
            invalid()
        }
        Err(_) => {
            tracing::warn!(timeout = ?state.config.validation_timeout, "validation timed out");
            invalid()
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
