//! Account email addresses.
//!
//! Only the shape is checked here. Whether the address exists, or is already
//! registered, is decided by the hosted auth service.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons an email address is rejected before it is sent to the backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Nothing but whitespace was entered.
    #[error("email cannot be empty")]
    Empty,
    /// Longer than the SMTP path limit.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Not of the form `name@domain`.
    #[error("email must look like name@domain")]
    Malformed,
}

/// An email address as typed on the auth form, minus surrounding whitespace.
///
/// The original casing is kept for display and for the backend; use
/// [`Email::normalized`] when comparing accounts.
///
/// ```
/// use wozify_core::Email;
///
/// let email = Email::parse("  Jane@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "Jane@Example.com");
/// assert_eq!(email.normalized(), "jane@example.com");
///
/// assert!(Email::parse("jane.example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an address from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or is not a
    /// single `@` with text on both sides and no inner whitespace.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let well_formed = trimmed.split_once('@').is_some_and(|(name, domain)| {
            !name.is_empty() && !domain.is_empty() && !domain.contains('@')
        }) && !trimmed.contains(char::is_whitespace);

        if !well_formed {
            return Err(EmailError::Malformed);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// The address as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased copy used as the account lookup key.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_input_is_trimmed() {
        let email = Email::parse("\t jane@example.com \n").unwrap();
        assert_eq!(email.as_str(), "jane@example.com");
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_lookup_key_ignores_case() {
        let typed = Email::parse("Jane@Example.COM").unwrap();
        let stored = Email::parse("jane@example.com").unwrap();

        assert_ne!(typed, stored);
        assert_eq!(typed.normalized(), stored.normalized());
        assert_eq!(typed.to_string(), "Jane@Example.COM");
    }

    #[test]
    fn test_rejects_what_the_auth_service_would() {
        for input in ["jane", "@example.com", "jane@", "ja ne@example.com", "a@b@c"] {
            assert_eq!(Email::parse(input), Err(EmailError::Malformed), "{input}");
        }

        let long = format!("{}@example.com", "a".repeat(Email::MAX_LENGTH));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("jane+shop@example.com").unwrap();
        assert_eq!(
            serde_json::to_string(&email).unwrap(),
            "\"jane+shop@example.com\""
        );
    }
}
