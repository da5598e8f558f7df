//! Authentication service.
//!
//! Wraps the backend's sign-in, sign-up and sign-out calls and keeps the
//! browser session in step with the backend session:
//!
//! - On success the [`AuthSession`] is written to the session store under
//!   [`session_keys::AUTH_SESSION`] and the session id is cycled.
//! - [`AuthService::current`] refreshes the access token shortly before it
//!   expires. Requests racing on the same refresh token share one exchange.
//!   A failed refresh signs the user out.
//! - Every transition is published as a [`SessionChange`] to subscribers of
//!   [`AuthService::subscribe`].

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::instrument;

use wozify_core::Email;

use crate::backend::{BackendError, DynBackend, SignUpOutcome};
use crate::models::{AuthSession, SessionUser, session_keys};

/// Capacity of the session-change channel.
///
/// Slow subscribers miss old events rather than blocking requests.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// How long a refreshed session is handed to other requests that still
/// present the refresh token it replaced.
const REFRESH_REUSE_WINDOW: Duration = Duration::from_secs(60);

/// A change in who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// A user signed in or signed up with an immediate session.
    SignedIn(SessionUser),
    /// The user signed out or their session could not be refreshed.
    SignedOut,
    /// The access token was replaced.
    TokenRefreshed(SessionUser),
}

impl SessionChange {
    /// The user the session now belongs to, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::SignedIn(user) | Self::TokenRefreshed(user) => Some(user),
            Self::SignedOut => None,
        }
    }
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The user is signed in.
    SignedIn(SessionUser),
    /// The account exists but must be confirmed by email before signing in.
    ConfirmationRequired(Email),
}

/// Authentication service.
///
/// Cheap to clone; clones share the backend and the change channel.
#[derive(Clone)]
pub struct AuthService {
    backend: DynBackend,
    changes: broadcast::Sender<SessionChange>,
    /// Refreshed sessions keyed by the refresh token they were issued for.
    refreshed: Cache<String, AuthSession>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(backend: DynBackend) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let refreshed = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(REFRESH_REUSE_WINDOW)
            .build();

        Self {
            backend,
            changes,
            refreshed,
        }
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::MissingPassword` before
    /// contacting the backend, `AuthError::Backend` if the backend rejects the
    /// credentials, and `AuthError::Session` if the session cannot be written.
    #[instrument(skip(self, session, password))]
    pub async fn sign_in(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, AuthError> {
        let email = Email::parse(email)?;
        let password = require_password(password)?;

        let auth = self.backend.sign_in(&email, &password).await?;
        let user = auth.user.clone();

        establish(session, &auth).await?;
        tracing::info!(user_id = %user.id, "User signed in");
        self.publish(SessionChange::SignedIn(user.clone()));

        Ok(user)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFullName`, `AuthError::InvalidEmail` or
    /// `AuthError::MissingPassword` before contacting the backend,
    /// `AuthError::Backend` if the backend rejects the sign-up, and
    /// `AuthError::Session` if the session cannot be written.
    #[instrument(skip(self, session, password))]
    pub async fn sign_up(
        &self,
        session: &Session,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Registration, AuthError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::MissingFullName);
        }
        let email = Email::parse(email)?;
        let password = require_password(password)?;

        match self.backend.sign_up(&email, &password, full_name).await? {
            SignUpOutcome::SignedIn(auth) => {
                let user = auth.user.clone();
                establish(session, &auth).await?;
                tracing::info!(user_id = %user.id, "User signed up");
                self.publish(SessionChange::SignedIn(user.clone()));
                Ok(Registration::SignedIn(user))
            }
            SignUpOutcome::ConfirmationRequired { email } => {
                tracing::info!("Sign-up awaiting email confirmation");
                Ok(Registration::ConfirmationRequired(email))
            }
        }
    }

    /// Sign out.
    ///
    /// The backend call is best effort; the browser session is always flushed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or flushed.
    #[instrument(skip(self, session))]
    pub async fn sign_out(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        if let Some(auth) = session.get::<AuthSession>(session_keys::AUTH_SESSION).await? {
            if let Err(e) = self.backend.sign_out(auth.access_token()).await {
                tracing::warn!(error = %e, "Backend sign-out failed");
            }
            tracing::info!(user_id = %auth.user.id, "User signed out");
        }

        session.flush().await?;
        self.publish(SessionChange::SignedOut);
        Ok(())
    }

    /// The signed-in session, refreshed if its access token is about to expire.
    ///
    /// Returns `None` when nobody is signed in or the refresh failed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session cannot be read or written.
    pub async fn current(&self, session: &Session) -> Result<Option<AuthSession>, AuthError> {
        let Some(auth) = stored(session).await? else {
            return Ok(None);
        };

        if !auth.needs_refresh(Utc::now()) {
            return Ok(Some(auth));
        }

        match self.refresh(&auth).await {
            Ok(refreshed) => {
                session
                    .insert(session_keys::AUTH_SESSION, &refreshed)
                    .await?;
                tracing::debug!(user_id = %refreshed.user.id, "Access token refreshed");
                self.publish(SessionChange::TokenRefreshed(refreshed.user.clone()));
                Ok(Some(refreshed))
            }
            Err(e) => {
                tracing::warn!(user_id = %auth.user.id, error = %e, "Token refresh failed, signing out");
                session
                    .remove::<AuthSession>(session_keys::AUTH_SESSION)
                    .await?;
                self.publish(SessionChange::SignedOut);
                Ok(None)
            }
        }
    }

    /// Exchange the session's refresh token, once per token.
    ///
    /// Refresh tokens are single use. Concurrent requests from one browser
    /// all carry the same token, so the first exchange is shared with every
    /// request that presents that token within [`REFRESH_REUSE_WINDOW`].
    async fn refresh(&self, auth: &AuthSession) -> Result<AuthSession, Arc<BackendError>> {
        let token = auth.refresh_token().expose_secret().to_string();
        self.refreshed
            .try_get_with(token, async {
                self.backend.refresh(auth.refresh_token()).await
            })
            .await
    }

    fn publish(&self, change: SessionChange) {
        if self.changes.send(change).is_err() {
            tracing::trace!("No session change subscribers");
        }
    }
}

async fn stored(session: &Session) -> Result<Option<AuthSession>, AuthError> {
    Ok(session.get::<AuthSession>(session_keys::AUTH_SESSION).await?)
}

async fn establish(session: &Session, auth: &AuthSession) -> Result<(), AuthError> {
    // New identity, new session id.
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_SESSION, auth).await?;
    Ok(())
}

fn require_password(password: &str) -> Result<SecretString, AuthError> {
    let password = SecretString::from(password);
    if password.expose_secret().is_empty() {
        return Err(AuthError::MissingPassword);
    }
    Ok(password)
}
