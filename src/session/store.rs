//! Token store: the current session token plus the identity derived from it.
//!
//! DESIGN
//! ======
//! Reads are synchronous (`std::sync::RwLock`) so the access guard can decide
//! "no token" without yielding. Remote validation is the only suspension
//! point. Concurrent validations of one token share a single backend call
//! through a `Shared` future keyed by the token. The entry lives as long as
//! some caller is still waiting on it, cancelled callers included.
//!
//! TRADE-OFFS
//! ==========
//! Validation is fail-closed: an unreachable backend is reported as not
//! valid. It never clears the token, though. Only an explicit `clear` does,
//! so a network blip cannot log the user out by itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::backend::{AuthBackend, UserIdentity};

/// Outcome of one remote validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// The backend answered and refused the token (or there was no token).
    Rejected,
    /// Network failure or timeout. The token may still be good.
    Unreachable,
}

impl Validation {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Token and identity held for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserIdentity,
    /// Whether the most recent validation of `token` succeeded. A fresh login
    /// counts as one.
    pub validated: bool,
}

type InFlight = Shared<BoxFuture<'static, Validation>>;

struct InFlightCall {
    id: u64,
    call: InFlight,
    waiters: usize,
}

type InFlightMap = Mutex<HashMap<String, InFlightCall>>;

/// One caller's claim on an in-flight call. Dropping it, whether the caller
/// finished or was cancelled, releases the claim; the last claim removes the
/// entry so a later validation starts a fresh backend call.
struct Waiter<'a> {
    in_flight: &'a InFlightMap,
    token: String,
    id: u64,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = in_flight.get_mut(&self.token) {
            if entry.id == self.id {
                entry.waiters -= 1;
                if entry.waiters == 0 {
                    in_flight.remove(&self.token);
                }
            }
        }
    }
}

pub struct TokenStore {
    session: RwLock<Option<Session>>,
    backend: Arc<dyn AuthBackend>,
    validation_timeout: Duration,
    in_flight: InFlightMap,
    next_call_id: AtomicU64,
}

impl TokenStore {
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, validation_timeout: Duration) -> Self {
        Self {
            session: RwLock::new(None),
            backend,
            validation_timeout,
            in_flight: Mutex::new(HashMap::new()),
            next_call_id: AtomicU64::new(0),
        }
    }

    /// Current token, if any.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// Full snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write(&self, token: String, user: UserIdentity) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(Session { token, user, validated: true });
    }

    pub fn clear(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Clear the session only if it still holds `token`. Returns whether it did.
    pub fn clear_if(&self, token: &str) -> bool {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.as_ref().is_some_and(|s| s.token == token) {
            *session = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.backend
    }

    /// Validate the current token against the backend.
    ///
    /// Returns [`Validation::Rejected`] without any network call when no token
    /// is held. The token and user are left untouched whatever the outcome;
    /// only the session's `validated` marker is updated.
    pub async fn validate(&self) -> Validation {
        let Some(token) = self.read() else {
            return Validation::Rejected;
        };

        let (call, waiter) = self.join_or_start(&token);
        let outcome = call.await;
        drop(waiter);

        if let Some(session) = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .filter(|s| s.token == token)
        {
            session.validated = outcome.is_valid();
        }

        outcome
    }

    /// `true` only if the backend positively confirmed the token.
    pub async fn validate_remotely(&self) -> bool {
        self.validate().await.is_valid()
    }

    fn join_or_start(&self, token: &str) -> (InFlight, Waiter<'_>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = in_flight.get_mut(token) {
            entry.waiters += 1;
            let waiter = Waiter { in_flight: &self.in_flight, token: token.to_owned(), id: entry.id };
            return (entry.call.clone(), waiter);
        }

        let backend = Arc::clone(&self.backend);
        let timeout = self.validation_timeout;
        let owned = token.to_owned();
        let call = async move {
            match tokio::time::timeout(timeout, backend.validate_token(&owned)).await {
                Ok(Ok(())) => Validation::Valid,
                Ok(Err(e)) if e.is_unreachable() => {
                    tracing::warn!(error = %e, "token validation could not reach backend");
                    Validation::Unreachable
                }
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "token rejected by backend");
                    Validation::Rejected
                }
                Err(_) => {
                    tracing::warn!(?timeout, "token validation timed out");
                    Validation::Unreachable
                }
            }
        }
        .boxed()
        .shared();

        let id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        in_flight.insert(token.to_owned(), InFlightCall { id, call: call.clone(), waiters: 1 });
        (call, Waiter { in_flight: &self.in_flight, token: token.to_owned(), id })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
