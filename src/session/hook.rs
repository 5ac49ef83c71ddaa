//! Auth-state accessor for UI components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components that only need to *show* identity (headers, avatars) read it
//! through [`AuthHook`]. The hook snapshots the token store once per mount and
//! never re-validates; route protection belongs to the access guard. A
//! snapshot can therefore go stale if the token expires after it was taken.

use std::sync::OnceLock;

use super::context::SessionContext;
use super::store::Session;
use crate::backend::UserIdentity;

/// Auth state as seen by one mounted component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserIdentity>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn loading() -> Self {
        Self { user: None, token: None, is_authenticated: false, is_loading: true }
    }

    #[must_use]
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(Session { token, user, validated }) => {
                Self { user: Some(user), token: Some(token), is_authenticated: validated, is_loading: false }
            }
            None => Self { user: None, token: None, is_authenticated: false, is_loading: false },
        }
    }
}

/// One hook instance per mounted component.
#[derive(Debug, Default)]
pub struct AuthHook {
    snapshot: OnceLock<AuthState>,
}

impl AuthHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First call snapshots the store; later calls return that same snapshot.
    pub fn use_auth(&self, session: &SessionContext) -> AuthState {
        self.snapshot
            .get_or_init(|| AuthState::from_session(session.store().session()))
            .clone()
    }

    /// The snapshot if taken, otherwise the loading state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.snapshot.get().cloned().unwrap_or_else(AuthState::loading)
    }
}

#[cfg(test)]
#[path = "hook_test.rs"]
mod tests;
