//! Store status values.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of a store.
///
/// Stores created by Wozify are always `active`. Any other value the backend
/// returns is kept verbatim so the dashboard can still display it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StoreStatus {
    #[default]
    Active,
    Other(String),
}

impl StoreStatus {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Other(value) => value,
        }
    }

    /// Returns `true` for the `active` status.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StoreStatus {
    fn from(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for StoreStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StoreStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}
