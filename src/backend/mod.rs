//! External auth backend.
//!
//! DESIGN
//! ======
//! The token store, access guard, and HTTP handlers only see [`AuthBackend`].
//! Production wires in [`wordpress::WordPressBackend`]; tests substitute
//! in-memory mocks.

pub mod wordpress;

use serde::{Deserialize, Serialize};

pub use wordpress::WordPressBackend;

// =============================================================================
// TYPES
// =============================================================================

/// Identity of the logged-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Backend user ID. The token endpoint does not report it.
    pub id: Option<i64>,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// Result of a successful credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub user: UserIdentity,
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by auth backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport failure or timeout. The backend never answered.
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected request: status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered 2xx but the body was not what we expected.
    #[error("backend response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BackendError {
    /// True when the backend could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// [`BackendError::Rejected`] for bad credentials; other variants for
    /// transport or parse failures.
    async fn issue_token(&self, username: &str, password: &str) -> Result<TokenGrant, BackendError>;

    /// Ask the backend whether `token` is still valid.
    ///
    /// # Errors
    ///
    /// [`BackendError::Rejected`] when the backend refuses the token.
    async fn validate_token(&self, token: &str) -> Result<(), BackendError>;

    /// Fetch the identity behind `token`.
    ///
    /// # Errors
    ///
    /// [`BackendError::Rejected`] when the backend refuses the token.
    async fn current_user(&self, token: &str) -> Result<UserIdentity, BackendError>;
}

// =============================================================================
// TEST HELPERS
// =============================================================================
