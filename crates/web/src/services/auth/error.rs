//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-up submitted without a full name.
    #[error("Full name is required")]
    MissingFullName,

    /// Password field left empty.
    #[error("Password is required")]
    MissingPassword,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wozify_core::EmailError),

    /// Backend rejected the request or could not be reached.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Browser session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Message rendered inline on the auth form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFullName | Self::MissingPassword => self.to_string(),
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::Backend(e) => e.user_message(),
            Self::Session(_) => "An error occurred".to_string(),
        }
    }

    /// Whether the failure came from user input rather than the server side.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::MissingFullName | Self::MissingPassword | Self::InvalidEmail(_) => true,
            Self::Backend(BackendError::Api { status, .. }) => *status >= 400 && *status < 500,
            Self::Backend(_) | Self::Session(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(AuthError::MissingFullName.user_message(), "Full name is required");
        assert_eq!(AuthError::MissingPassword.user_message(), "Password is required");
    }

    #[test]
    fn test_backend_message_passes_through() {
        let err = AuthError::Backend(BackendError::Api {
            status: 400,
            message: "Invalid login credentials".to_string(),
        });
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_side_failures() {
        let err = AuthError::Backend(BackendError::Parse("bad json".to_string()));
        assert!(!err.is_client_error());
        assert_eq!(err.user_message(), "An error occurred");
    }
}
