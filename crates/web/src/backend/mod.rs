//! Hosted backend-as-a-service clients.
//!
//! # Architecture
//!
//! - The backend owns authentication, the `profiles` table and the `stores`
//!   table. Wozify keeps no database of its own.
//! - Row-level security on the backend scopes every table request to the
//!   user whose access token is attached.
//! - [`Backend`] is the seam the rest of the crate talks to; route handlers
//!   never see HTTP details.
//!
//! # Implementations
//!
//! - [`SupabaseBackend`] - REST client for a hosted Supabase project
//! - [`MemoryBackend`] - in-process backend for local development and tests

mod memory;
mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use wozify_core::{Email, NewStore, Profile, Store};

use crate::config::BackendConfig;
use crate::models::AuthSession;

/// Shared handle to the configured backend.
pub type DynBackend = Arc<dyn Backend>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Backend client could not be constructed.
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    /// Message shown to the user next to the form that triggered the call.
    ///
    /// Backend-reported messages pass through verbatim; transport and parse
    /// failures get a generic message so internals are not leaked.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Http(e) if e.is_timeout() => "The request timed out. Please try again.".to_string(),
            Self::Http(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Parse(_) | Self::InvalidConfig(_) => "An error occurred".to_string(),
        }
    }

    /// Whether the backend refused the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

/// Result of a sign-up call.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// Account created and signed in.
    SignedIn(AuthSession),
    /// Account created but the backend requires email confirmation first.
    ConfirmationRequired { email: Email },
}

/// Operations Wozify needs from the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create an account. `full_name` is stored as user metadata and copied
    /// into the user's profile by the backend.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        full_name: &str,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Exchange email and password for a session.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError>;

    /// Exchange a refresh token for a new session.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<AuthSession, BackendError>;

    /// Revoke the session's tokens.
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), BackendError>;

    /// Fetch the profile row for the session user.
    async fn profile(&self, session: &AuthSession) -> Result<Option<Profile>, BackendError>;

    /// Insert a row into `stores`.
    async fn insert_store(
        &self,
        session: &AuthSession,
        store: &NewStore,
    ) -> Result<(), BackendError>;

    /// All stores owned by the session user, newest first.
    async fn list_stores(&self, session: &AuthSession) -> Result<Vec<Store>, BackendError>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// Build the backend selected by configuration.
///
/// # Errors
///
/// Returns `BackendError::InvalidConfig` if the HTTP client cannot be built.
pub fn from_config(config: &BackendConfig) -> Result<DynBackend, BackendError> {
    match config {
        BackendConfig::Supabase(supabase) => Ok(Arc::new(SupabaseBackend::new(supabase)?)),
        BackendConfig::Memory => {
            tracing::warn!("Using in-memory backend; data will not survive a restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_message_is_verbatim() {
        let err = BackendError::Api {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert_eq!(err.to_string(), "API error: 400 - Invalid login credentials");
    }

    #[test]
    fn test_parse_error_message_is_generic() {
        let err = BackendError::Parse("missing field `id`".to_string());
        assert_eq!(err.user_message(), "An error occurred");
    }

    #[test]
    fn test_is_unauthorized() {
        let err = BackendError::Api {
            status: 401,
            message: "JWT expired".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = BackendError::Api {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(!err.is_unauthorized());
    }
}
