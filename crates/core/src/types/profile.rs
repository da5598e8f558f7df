//! User profile records from the `profiles` table.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// A user's profile.
///
/// Created by the backend when the user signs up; Wozify only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Profile {
    /// Name to show in the dashboard header: full name, else email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.email.as_str(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let profile = Profile {
            id: UserId::random(),
            email: Email::parse("jane@example.com").unwrap(),
            full_name: Some("Jane Doe".to_string()),
        };
        assert_eq!(profile.display_name(), "Jane Doe");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let profile = Profile {
            id: UserId::random(),
            email: Email::parse("jane@example.com").unwrap(),
            full_name: Some("  ".to_string()),
        };
        assert_eq!(profile.display_name(), "jane@example.com");
    }
}
