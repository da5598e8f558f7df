//! Session-related types.
//!
//! Types stored in the browser session for authentication state.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use wozify_core::{Email, Profile, UserId};

/// Refresh the access token when it expires within this window.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// The authenticated user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Backend user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Full name from sign-up metadata, if any.
    pub full_name: Option<String>,
}

/// A backend session: the user plus the tokens that authorize table access.
///
/// Stored server-side in the session store; the tokens never reach templates.
/// `Debug` is implemented manually to redact them.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    #[serde(serialize_with = "expose", deserialize_with = "conceal")]
    access_token: SecretString,
    #[serde(serialize_with = "expose", deserialize_with = "conceal")]
    refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new session.
    #[must_use]
    pub const fn new(
        user: SessionUser,
        access_token: SecretString,
        refresh_token: SecretString,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Bearer token for table requests.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// Token used to obtain a fresh access token.
    #[must_use]
    pub const fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// Whether the access token is expired or about to expire at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECONDS) <= now
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Build a profile from session data when the `profiles` row is unavailable.
#[must_use]
pub fn profile_from_session(user: &SessionUser) -> Profile {
    Profile {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
    }
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn conceal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current backend session.
    pub const AUTH_SESSION: &str = "auth_session";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession::new(
            SessionUser {
                id: UserId::random(),
                email: Email::parse("jane@example.com").unwrap(),
                full_name: Some("Jane Doe".to_string()),
            },
            SecretString::from("access-token-value"),
            SecretString::from("refresh-token-value"),
            expires_at,
        )
    }

    #[test]
    fn test_needs_refresh_within_margin() {
        let now = Utc::now();
        assert!(session_expiring_at(now + Duration::seconds(30)).needs_refresh(now));
        assert!(session_expiring_at(now - Duration::seconds(1)).needs_refresh(now));
        assert!(!session_expiring_at(now + Duration::minutes(30)).needs_refresh(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = session_expiring_at(Utc::now());
        let debug_output = format!("{session:?}");
        assert!(debug_output.contains("jane@example.com"));
        assert!(!debug_output.contains("access-token-value"));
        assert!(!debug_output.contains("refresh-token-value"));
    }

    #[test]
    fn test_session_store_roundtrip_keeps_tokens() {
        let session = session_expiring_at(Utc::now());
        let json = serde_json::to_value(&session).unwrap();
        let restored: AuthSession = serde_json::from_value(json).unwrap();
        assert_eq!(restored.access_token().expose_secret(), "access-token-value");
        assert_eq!(restored.refresh_token().expose_secret(), "refresh-token-value");
        assert_eq!(restored.user, session.user);
    }

    #[test]
    fn test_profile_from_session() {
        let session = session_expiring_at(Utc::now());
        let profile = profile_from_session(&session.user);
        assert_eq!(profile.display_name(), "Jane Doe");
        assert_eq!(profile.id, session.user.id);
    }
}
