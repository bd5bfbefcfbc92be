//! Process-wide authentication session.
//!
//! `SessionManager` owns the session snapshot and the persisted credential
//! store. Consumers read the snapshot; all mutation goes through the four
//! operations (`initialize`, `login`, `logout`, `refresh_access_token`).
//! Mutating operations take `&mut self`, so overlapping writes are excluded
//! by the borrow checker rather than by a lock, and the snapshot is always
//! replaced wholesale.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{LoginCredentials, UserProfile};

use super::store::SessionStore;

/// Read-only view of the current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl Session {
    /// State at process start, before `initialize` has resolved.
    fn initial() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: true,
        }
    }

    fn unauthenticated() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: false,
        }
    }

    fn authenticated(user: UserProfile, loading: bool) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            loading,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

/// Result of a login attempt, with a display-ready message on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Failed(String),
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// No refresh token is persisted; the caller should send the user back
    /// to the login screen instead of retrying.
    #[error("No refresh token")]
    MissingRefreshToken,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub struct SessionManager {
    client: ApiClient,
    store: SessionStore,
    session: Session,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        Self {
            client,
            store,
            session: Session::initial(),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Owned copy of the snapshot, for consumers that outlive the borrow.
    pub fn snapshot(&self) -> Session {
        self.session.clone()
    }

    /// Restore the session from persisted storage, once at startup.
    ///
    /// With nothing persisted this resolves immediately to unauthenticated.
    /// With a persisted credential pair the session is optimistically marked
    /// authenticated using the cached profile, then validated against
    /// `GET /auth/profile/`; the fresh profile replaces the cached one. Any
    /// failure along the way (unreadable storage, unparsable cached profile,
    /// rejected token) ends in `logout`.
    pub async fn initialize(&mut self) {
        let access_token = match self.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                self.logout().await;
                return;
            }
        };

        let Some(access_token) = access_token else {
            self.session = Session::unauthenticated();
            return;
        };

        let cached = match self.store.cached_profile() {
            Ok(Some(profile)) => profile,
            // A token without a profile violates the all-or-nothing
            // invariant; treat it like an invalid token.
            Ok(None) => {
                debug!("Access token present without cached profile");
                self.logout().await;
                return;
            }
            Err(e) => {
                debug!(error = %e, "Cached profile unreadable");
                self.logout().await;
                return;
            }
        };

        self.client.set_token(access_token);
        self.session = Session::authenticated(cached, true);

        match self.client.fetch_profile().await {
            Ok(fresh) => {
                debug!(user = %fresh.username, "Restored session validated");
                self.session = Session::authenticated(fresh, false);
            }
            Err(e) => {
                debug!(error = %e, "Restored token rejected");
                self.logout().await;
            }
        }
    }

    /// Authenticate with the backend and persist the issued credentials.
    ///
    /// Failures never propagate as errors; they come back as
    /// `LoginOutcome::Failed` with a message fit for display.
    pub async fn login(&mut self, credentials: &LoginCredentials) -> LoginOutcome {
        self.session.loading = true;

        let response = match self.client.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                debug!(username = %credentials.username, error = %e, "Login failed");
                self.session.loading = false;
                return LoginOutcome::Failed(e.login_message());
            }
        };

        if let Err(e) =
            self.store
                .store_login(&response.access_token, &response.refresh_token, &response.user)
        {
            warn!(error = %e, "Failed to persist session after login");
            self.session.loading = false;
            return LoginOutcome::Failed(e.to_string());
        }

        info!(user = %response.user.username, "Login succeeded");
        self.client.set_token(response.access_token);
        self.session = Session::authenticated(response.user, false);
        LoginOutcome::Success
    }

    /// End the session.
    ///
    /// The backend is notified with the current refresh token on a
    /// best-effort basis; a failure there is logged and ignored. Local state
    /// is cleared unconditionally.
    pub async fn logout(&mut self) {
        match self.store.refresh_token() {
            Ok(Some(refresh_token)) => {
                if let Err(e) = self.client.logout(&refresh_token).await {
                    debug!(error = %e, "Logout notification failed (ignored)");
                }
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Could not read refresh token for logout"),
        }

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.client.clear_token();
        self.session = Session::unauthenticated();
        info!("Session cleared");
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// Returns the new token and persists it; the refresh token itself is
    /// left untouched. A missing refresh token or a rejected exchange forces
    /// `logout` before the error reaches the caller.
    pub async fn refresh_access_token(&mut self) -> Result<String, AuthError> {
        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.logout().await;
                return Err(AuthError::MissingRefreshToken);
            }
            Err(e) => {
                self.logout().await;
                return Err(AuthError::Storage(e));
            }
        };

        match self.client.refresh(&refresh_token).await {
            Ok(response) => {
                self.store.store_access_token(&response.access_token)?;
                self.client.set_token(response.access_token.clone());
                debug!("Access token refreshed");
                Ok(response.access_token)
            }
            Err(e) => {
                debug!(error = %e, "Token refresh rejected");
                self.logout().await;
                Err(e.into())
            }
        }
    }

    /// Authorized GET that refreshes the access token once on a 401 and
    /// retries, so call sites recover from an expired token without their
    /// own retry logic. A second rejection propagates.
    pub async fn get_with_refresh<T: DeserializeOwned>(
        &mut self,
        path: &str,
    ) -> Result<T, AuthError> {
        match self.client.get(path).await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => {
                self.refresh_access_token().await?;
                Ok(self.client.get(path).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
