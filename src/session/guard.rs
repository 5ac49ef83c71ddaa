//! Access guard for protected UI subtrees.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge middleware only checks that a cookie exists. The guard is where a
//! token is actually proven: it validates against the backend once per mount
//! and bounces to login when the backend says no (or cannot be reached).
//!
//! State machine: `Validating -> { Authenticated, Unauthenticated }`.
//!
//! - No local token: straight to `Unauthenticated`, no network call, no
//!   navigation. The login prompt is rendered instead.
//! - Validation fails: `Unauthenticated` plus exactly one navigation to login.
//!   A backend rejection also clears the store if it still holds the rejected
//!   token; an unreachable backend leaves the token in place.
//! - Unmounted mid-flight: the result is dropped on the floor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::context::SessionContext;
use super::store::Validation;
use crate::access::LOGIN_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Validating,
    Authenticated,
    Unauthenticated,
}

/// Client-side navigation hook supplied by the host UI.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// What the guard wants on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<V> {
    /// Default loading spinner.
    Spinner,
    /// Default "please log in" prompt. `login_path` backs its button.
    LoginPrompt { login_path: String },
    /// Caller-supplied placeholder/fallback, or the protected children.
    View(V),
}

type ViewFn<V> = Box<dyn Fn() -> V + Send + Sync>;

pub struct GuardOptions<V> {
    pub placeholder: Option<ViewFn<V>>,
    pub fallback: Option<ViewFn<V>>,
    pub login_path: String,
}

impl<V> Default for GuardOptions<V> {
    fn default() -> Self {
        Self { placeholder: None, fallback: None, login_path: LOGIN_PATH.to_owned() }
    }
}

pub struct AccessGuard<V> {
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
    options: GuardOptions<V>,
    state: Mutex<GuardState>,
    mounted: AtomicBool,
    started: AtomicBool,
}

impl<V> AccessGuard<V> {
    /// Mount a guard. It starts in [`GuardState::Validating`]; call
    /// [`AccessGuard::check`] to drive it.
    #[must_use]
    pub fn mount(session: SessionContext, navigator: Arc<dyn Navigator>, options: GuardOptions<V>) -> Self {
        Self {
            session,
            navigator,
            options,
            state: Mutex::new(GuardState::Validating),
            mounted: AtomicBool::new(true),
            started: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Run the validation lifecycle. Only the first call per mount does any
    /// work; later calls return the current state.
    pub async fn check(&self) -> GuardState {
        if !self.is_mounted() || self.started.swap(true, Ordering::AcqRel) {
            return self.state();
        }

        let store = self.session.store();
        let Some(token) = store.read() else {
            self.settle(GuardState::Unauthenticated);
            return GuardState::Unauthenticated;
        };

        let outcome = store.validate().await;
        if !self.is_mounted() {
            tracing::debug!(?outcome, "guard unmounted during validation, discarding result");
            return self.state();
        }

        match outcome {
            Validation::Valid => {
                self.settle(GuardState::Authenticated);
                GuardState::Authenticated
            }
            Validation::Rejected | Validation::Unreachable => {
                // A newer login may have replaced the token while this one was checked.
                if outcome == Validation::Rejected && !store.clear_if(&token) {
                    tracing::debug!("session changed during validation, keeping newer token");
                }
                self.settle(GuardState::Unauthenticated);
                tracing::info!(
                    ?outcome,
                    login_path = %self.options.login_path,
                    "validation failed, redirecting to login"
                );
                self.navigator.navigate(&self.options.login_path);
                GuardState::Unauthenticated
            }
        }
    }

    /// Stop accepting results. An in-flight `check` will not update state or
    /// navigate after this.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// Manual action behind the login prompt.
    pub fn go_to_login(&self) {
        self.navigator.navigate(&self.options.login_path);
    }

    pub fn render(&self, children: impl FnOnce() -> V) -> Screen<V> {
        match self.state() {
            GuardState::Validating => self
                .options
                .placeholder
                .as_ref()
                .map_or(Screen::Spinner, |view| Screen::View(view())),
            GuardState::Authenticated => Screen::View(children()),
            GuardState::Unauthenticated => self.options.fallback.as_ref().map_or_else(
                || Screen::LoginPrompt { login_path: self.options.login_path.clone() },
                |view| Screen::View(view()),
            ),
        }
    }

    fn settle(&self, next: GuardState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
