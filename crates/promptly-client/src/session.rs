//! Authentication session lifecycle
//!
//! The session starts out `loading`, validates a persisted token against
//! the `me` endpoint and settles in either `authenticated` or
//! `unauthenticated`. Every failure path converges on `unauthenticated`;
//! nothing in here returns an error for validation or logout.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use promptly_core::activity::{ActivityResult, ActivityUser};
use promptly_core::models::User;
use promptly_core::storage::TOKEN_KEY;
use promptly_core::{Observable, Subscription};

use crate::activity_tracker::ActivityTracker;
use crate::api::ApiClient;
use crate::Result;

/// Snapshot of the authentication state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
}

/// Coarse view of [`AuthState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// State on process start, before the stored token has been checked
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: false,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            loading: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Loading
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Owner of the authentication lifecycle
///
/// Shares its state with the [`ApiClient`] so that a 401 from any request
/// signs the session out.
pub struct SessionStore {
    api: Arc<ApiClient>,
    state: Observable<AuthState>,
    tracker: Option<Arc<ActivityTracker>>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let state = api.auth_state();
        Self {
            api,
            state,
            tracker: None,
        }
    }

    /// Report logouts through `tracker`
    pub fn with_activity_tracker(mut self, tracker: Arc<ActivityTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Subscription<AuthState> {
        self.state.subscribe()
    }

    /// Current user, if authenticated
    pub fn user(&self) -> Option<User> {
        self.state.get().user
    }

    /// Resolve the startup state from the persisted token
    pub async fn init(&self) {
        if self.api.stored_token().is_some() {
            self.validate_token().await;
        } else {
            debug!("No stored token, starting unauthenticated");
            self.state.set(AuthState::signed_out());
        }
    }

    /// Check the stored token against the `me` endpoint
    pub async fn validate_token(&self) {
        let Some(token) = self.api.stored_token() else {
            self.logout().await;
            return;
        };

        self.state.update(|state| state.loading = true);

        match self.api.current_user(&token).await {
            Ok(user) => {
                info!(
                    user_id = %user.user_id,
                    database = %user.local_database_filename(),
                    "Token validated"
                );
                self.state.set(AuthState::signed_in(user));
            }
            Err(e) => {
                warn!("Token validation failed: {}", e);
                self.logout().await;
            }
        }
    }

    /// Send the user to the external login page
    pub fn login(&self) -> Result<()> {
        self.api.navigator().navigate(self.api.login_url())?;
        Ok(())
    }

    /// Persist a token obtained from the login flow
    pub fn store_token(&self, token: &str) -> Result<()> {
        self.api.storage().set(TOKEN_KEY, token.trim())?;
        Ok(())
    }

    /// Sign out locally, then tell the backend.
    ///
    /// Local state is cleared first and unconditionally; a failing backend
    /// call only changes the reported activity result.
    pub async fn logout(&self) {
        // Read before any await: a concurrent 401 may null the user out
        let user = self.state.get().user;

        if let Err(e) = self.api.storage().remove(TOKEN_KEY) {
            warn!("Failed to remove stored token: {}", e);
        }
        self.state.set(AuthState::signed_out());

        let result = match self.api.notify_logout().await {
            Ok(()) => {
                debug!("Backend logout acknowledged");
                ActivityResult::Success
            }
            Err(e) => {
                info!("Logout API call failed, but local logout successful: {}", e);
                ActivityResult::Failure
            }
        };

        if let (Some(tracker), Some(user)) = (&self.tracker, user) {
            tracker
                .track_logout(&ActivityUser::from(&user), result)
                .await;
        }
    }
}
