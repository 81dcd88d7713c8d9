//! Authentication state for the whole process.
//!
//! # Design
//! `Session` is the only writer of the persisted token and the cached
//! current user. Every change goes through one of its transition methods,
//! and the UI only ever sees a [`SessionSnapshot`]. The states are:
//!
//! ```text
//! Anonymous --login--> Authenticating --ok--> Authenticated
//!     ^                     |
//!     |                     +--err--> Error --reset_error--> Anonymous
//!     +------------------- logout (from any state) ----------------+
//! ```
//!
//! The state mutex is never held across an await, so a second `login`
//! arriving while the first is in flight sees `Authenticating` and returns
//! without touching the network. Writes to the store happen under the same
//! mutex, so a `logout` cannot interleave with a login persisting its token.
//!
//! The session installs its own [`TokenProvider`] into the client. When any
//! call made through [`Session::client`] gets a 401 for the stored token,
//! the provider logs the session out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{StoredToken, TokenProvider};
use crate::cancel::CancelToken;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notify::{error_message, GENERIC_ERROR_MESSAGE};
use crate::storage::{StorageError, TokenStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{LoginForm, Message, UpdatePassword, UserPublic, UserUpdateMe};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated { user: Option<UserPublic> },
    Error { message: String },
}

/// What a `login` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Token stored; the current user has been fetched if possible.
    Authenticated,
    /// Another login was already in flight; nothing was sent.
    InFlight,
    /// A token is already present; nothing was sent.
    AlreadyAuthenticated,
    /// `logout` or a 401 ran before the login completed; the token was
    /// discarded.
    Superseded,
}

/// Entries of the side navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Dashboard,
    Settings,
    Admin,
}

impl NavItem {
    pub fn title(self) -> &'static str {
        match self {
            NavItem::Dashboard => "Dashboard",
            NavItem::Settings => "User Settings",
            NavItem::Admin => "Admin",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            NavItem::Dashboard => "/",
            NavItem::Settings => "/settings",
            NavItem::Admin => "/admin",
        }
    }
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<UserPublic>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Navigation visible to the current user. `Admin` is superuser-only.
    pub fn nav_items(&self) -> Vec<NavItem> {
        let mut items = vec![NavItem::Dashboard, NavItem::Settings];
        if self.user.as_ref().is_some_and(UserPublic::is_admin) {
            items.push(NavItem::Admin);
        }
        items
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hands the stored token to the client and logs out when it is rejected.
struct SessionToken {
    stored: StoredToken,
    store: Arc<dyn TokenStore>,
    state: Arc<Mutex<SessionState>>,
}

#[async_trait]
impl TokenProvider for SessionToken {
    async fn token(&self) -> Option<String> {
        self.stored.token().await
    }

    fn rejected(&self, token: &str) {
        let mut state = lock(&self.state);
        match self.store.get() {
            Ok(Some(current)) if current != token => {
                debug!("rejected token was already replaced; keeping session");
                return;
            }
            Ok(None) if *state == SessionState::Anonymous => return,
            Ok(_) => {}
            Err(error) => warn!(%error, "failed to read persisted token"),
        }
        warn!("server rejected the token; logging out");
        *state = SessionState::Anonymous;
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear persisted token");
        }
    }
}

pub struct Session {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        let state = match store.get() {
            Ok(Some(_)) => SessionState::Authenticated { user: None },
            Ok(None) => SessionState::Anonymous,
            Err(error) => {
                warn!(%error, "failed to read persisted token; starting anonymous");
                SessionState::Anonymous
            }
        };
        let state = Arc::new(Mutex::new(state));
        let tokens = SessionToken {
            stored: StoredToken::new(Arc::clone(&store)),
            store: Arc::clone(&store),
            state: Arc::clone(&state),
        };
        let client = ApiClient::new(base_url, transport)
            .with_token_provider(Arc::new(tokens));
        Self {
            client,
            store,
            state,
        }
    }

    /// Session over `reqwest` with the token persisted on disk.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let store = config.token_store()?;
        Ok(Self::new(&config.base_url, Arc::new(transport), Arc::new(store)))
    }

    /// The session's client. A 401 to any call made through it for the
    /// stored token logs the session out.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// True iff a token is persisted.
    pub fn is_logged_in(&self) -> bool {
        matches!(self.store.get(), Ok(Some(_)))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &*self.state() {
            SessionState::Anonymous => SessionSnapshot {
                status: SessionStatus::Anonymous,
                user: None,
                error: None,
            },
            SessionState::Authenticating => SessionSnapshot {
                status: SessionStatus::Authenticating,
                user: None,
                error: None,
            },
            SessionState::Authenticated { user } => SessionSnapshot {
                status: SessionStatus::Authenticated,
                user: user.clone(),
                error: None,
            },
            SessionState::Error { message } => SessionSnapshot {
                status: SessionStatus::Error,
                user: None,
                error: Some(message.clone()),
            },
        }
    }

    pub async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, SessionError> {
        self.run_login(form, None).await
    }

    /// Like [`login`](Self::login), but abandons the request when `cancel`
    /// fires. A cancelled login returns to `Anonymous` without an error
    /// message.
    pub async fn login_with_cancel(
        &self,
        form: &LoginForm,
        cancel: CancelToken,
    ) -> Result<LoginOutcome, SessionError> {
        self.run_login(form, Some(cancel)).await
    }

    async fn run_login(
        &self,
        form: &LoginForm,
        cancel: Option<CancelToken>,
    ) -> Result<LoginOutcome, SessionError> {
        {
            let mut state = self.state();
            match *state {
                SessionState::Authenticating => {
                    debug!("login already in flight; ignoring trigger");
                    return Ok(LoginOutcome::InFlight);
                }
                SessionState::Authenticated { .. } => {
                    return Ok(LoginOutcome::AlreadyAuthenticated);
                }
                SessionState::Anonymous | SessionState::Error { .. } => {}
            }
            *state = SessionState::Authenticating;
        }

        let mut call = self.client.login().access_token(form);
        if let Some(cancel) = cancel {
            call = call.with_cancel(cancel);
        }
        let result = call.await;

        {
            let mut state = self.state();
            if *state != SessionState::Authenticating {
                debug!("session changed while login was in flight; discarding result");
                return Ok(LoginOutcome::Superseded);
            }
            let token = match result {
                Ok(token) => token,
                Err(ApiError::Cancelled) => {
                    *state = SessionState::Anonymous;
                    return Err(ApiError::Cancelled.into());
                }
                Err(err) => {
                    let message = error_message(&err);
                    info!(%err, "login failed");
                    *state = SessionState::Error { message };
                    return Err(err.into());
                }
            };
            if let Err(err) = self.store.set(&token.access_token) {
                *state = SessionState::Error {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                };
                return Err(err.into());
            }
            *state = SessionState::Authenticated { user: None };
        }
        info!("login succeeded");

        if let Err(error) = self.refresh_user().await {
            warn!(%error, "failed to fetch current user after login");
        }
        let authenticated = matches!(*self.state(), SessionState::Authenticated { .. });
        if !authenticated {
            debug!("session logged out while fetching the current user");
            return Ok(LoginOutcome::Superseded);
        }
        Ok(LoginOutcome::Authenticated)
    }

    /// Forget the token and the cached user. Safe to call in any state and
    /// any number of times.
    pub fn logout(&self) -> Result<(), StorageError> {
        let mut state = self.state();
        let previous = std::mem::replace(&mut *state, SessionState::Anonymous);
        if previous != SessionState::Anonymous {
            info!("session logged out");
        }
        self.store.clear()
    }

    /// Leave the `Error` state. No effect in any other state.
    pub fn reset_error(&self) {
        let mut state = self.state();
        if matches!(*state, SessionState::Error { .. }) {
            *state = SessionState::Anonymous;
        }
    }

    /// Fetch `/users/me` into the cache. Returns `Ok(None)` without a request
    /// when no token is stored.
    pub async fn refresh_user(&self) -> Result<Option<UserPublic>, ApiError> {
        if !self.is_logged_in() {
            return Ok(None);
        }
        let user = self.client.users().read_me().await?;
        self.cache_user(&user);
        Ok(Some(user))
    }

    /// Update the current user's profile and refresh the cache.
    pub async fn update_me(&self, update: &UserUpdateMe) -> Result<UserPublic, ApiError> {
        let user = self.client.users().update_me(update).await?;
        self.cache_user(&user);
        Ok(user)
    }

    pub async fn update_password(&self, body: &UpdatePassword) -> Result<Message, ApiError> {
        self.client.users().update_password_me(body).await
    }

    /// Delete the current account, then log out.
    pub async fn delete_me(&self) -> Result<Message, ApiError> {
        let message = self.client.users().delete_me().await?;
        if let Err(error) = self.logout() {
            warn!(%error, "failed to clear persisted token");
        }
        Ok(message)
    }

    fn cache_user(&self, fresh: &UserPublic) {
        if let SessionState::Authenticated { user } = &mut *self.state() {
            *user = Some(fresh.clone());
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }
}
