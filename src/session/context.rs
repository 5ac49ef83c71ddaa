//! Scoped session context.
//!
//! Created once at application start and handed to every hook and guard that
//! needs auth state. Login sets it, logout clears it. There is no global.

use std::sync::Arc;
use std::time::Duration;

use super::store::TokenStore;
use crate::backend::{AuthBackend, BackendError, UserIdentity};

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<TokenStore>,
}

impl SessionContext {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, validation_timeout: Duration) -> Self {
        Self { store: Arc::new(TokenStore::new(backend, validation_timeout)) }
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Exchange credentials for a token and remember both token and identity.
    ///
    /// # Errors
    ///
    /// Propagates the backend error; the store is left unchanged.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, BackendError> {
        let grant = self.store.backend().issue_token(username, password).await?;
        tracing::info!(username = %grant.user.username, "session established");
        self.store.write(grant.token, grant.user.clone());
        Ok(grant.user)
    }

    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("session cleared");
    }
}
