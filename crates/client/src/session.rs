//! In-process session state: bearer token and last-submitted analysis id.
//!
//! The store replaces the browser session storage the original product
//! relied on. Handles are cheap to clone and share one underlying state,
//! so the API client and a polling task always observe the same token.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Plain session contents. Serializable so a front end can persist the
/// session between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub last_analysis_id: Option<String>,
}

/// Shared, thread-safe handle to the session state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    /// Empty session: no token, no last analysis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously persisted state.
    pub fn with_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Current bearer token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Store the bearer token from a successful login or registration.
    pub fn set_token(&self, token: String) {
        self.lock().token = Some(token);
    }

    /// Drop the bearer token (the service rejected it, or logout).
    pub fn clear_token(&self) {
        self.lock().token = None;
    }

    /// Id of the most recently submitted analysis, if any.
    pub fn last_analysis_id(&self) -> Option<String> {
        self.lock().last_analysis_id.clone()
    }

    /// Remember the most recently submitted analysis.
    pub fn set_last_analysis_id(&self, id: String) {
        self.lock().last_analysis_id = Some(id);
    }

    /// Forget the most recently submitted analysis (e.g. the service no
    /// longer knows it).
    pub fn clear_last_analysis_id(&self) {
        self.lock().last_analysis_id = None;
    }

    /// Logout: drop both the token and the last analysis id.
    pub fn clear(&self) {
        *self.lock() = SessionState::default();
    }

    /// Copy of the current state, for persistence.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // Writers never panic while holding the lock, so poisoning only
        // occurs if a reader panicked; the state is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
