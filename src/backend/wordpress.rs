//! WordPress JWT auth client.
//!
//! Thin HTTP wrapper over the `jwt-auth/v1` plugin endpoints and the core
//! `users/me` route. Response handling lives in pure `parse_*` functions for
//! testability.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{AuthBackend, BackendError, TokenGrant, UserIdentity};
use crate::config::BackendTimeouts;

pub const TOKEN_PATH: &str = "/wp-json/jwt-auth/v1/token";
pub const VALIDATE_PATH: &str = "/wp-json/jwt-auth/v1/token/validate";
pub const CURRENT_USER_PATH: &str = "/wp-json/wp/v2/users/me";

// =============================================================================
// CLIENT
// =============================================================================

pub struct WordPressBackend {
    http: reqwest::Client,
    base_url: String,
}

impl WordPressBackend {
    /// Build a client for the WordPress site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeouts: BackendTimeouts) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl AuthBackend for WordPressBackend {
    async fn issue_token(&self, username: &str, password: &str) -> Result<TokenGrant, BackendError> {
        let request = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&serde_json::json!({ "username": username, "password": password }));
        let (status, body) = self.send(request).await?;
        parse_token_grant(status, &body)
    }

    async fn validate_token(&self, token: &str) -> Result<(), BackendError> {
        let request = self.http.post(self.url(VALIDATE_PATH)).bearer_auth(token);
        let (status, body) = self.send(request).await?;
        check_status(status, &body)
    }

    async fn current_user(&self, token: &str) -> Result<UserIdentity, BackendError> {
        let request = self.http.get(self.url(CURRENT_USER_PATH)).bearer_auth(token);
        let (status, body) = self.send(request).await?;
        parse_current_user(status, &body)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(default)]
    user_email: Option<String>,
    #[serde(default)]
    user_nicename: Option<String>,
    #[serde(default)]
    user_display_name: Option<String>,
}

#[derive(Deserialize)]
struct CurrentUserResponse {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Map a non-2xx status to [`BackendError::Rejected`].
pub(crate) fn check_status(status: u16, body: &str) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(BackendError::Rejected { status, message: rejection_message(body) })
    }
}

/// WordPress errors look like `{"code": "...", "message": "...", "data": {...}}`.
/// Messages may contain HTML; we pass them through untouched.
pub(crate) fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map_or_else(|_| body.trim().to_owned(), |e| e.message)
}

pub(crate) fn parse_token_grant(status: u16, body: &str) -> Result<TokenGrant, BackendError> {
    check_status(status, body)?;
    // Never echo the body: it carries the issued token.
    let resp: TokenResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Parse(format!("unexpected token response: {e}")))?;
    if resp.token.is_empty() {
        return Err(BackendError::Parse("token response carried an empty token".into()));
    }

    let username = resp.user_nicename.unwrap_or_default();
    let display_name = resp.user_display_name.unwrap_or_else(|| username.clone());
    Ok(TokenGrant {
        token: resp.token,
        user: UserIdentity { id: None, username, display_name, email: resp.user_email },
    })
}

pub(crate) fn parse_current_user(status: u16, body: &str) -> Result<UserIdentity, BackendError> {
    check_status(status, body)?;
    let resp: CurrentUserResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Parse(format!("unexpected user response: {e}")))?;

    let username = resp.slug.unwrap_or_default();
    let display_name = resp.name.unwrap_or_else(|| username.clone());
    Ok(UserIdentity { id: Some(resp.id), username, display_name, email: resp.email })
}

#[cfg(test)]
#[path = "wordpress_test.rs"]
mod tests;
