//! Store records exchanged with the `stores` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{StoreId, UserId};
use super::slug::Slug;
use super::status::StoreStatus;

/// Default apex domain for stores without a custom domain.
pub const DEFAULT_STORE_DOMAIN: &str = "wozify.com";

/// A store row as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub user_id: UserId,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: StoreStatus,
    #[serde(default)]
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Domain shown on the dashboard card.
    ///
    /// The custom domain wins; otherwise `{slug}.{apex}`.
    #[must_use]
    pub fn display_domain(&self, apex: &str) -> String {
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => domain.to_string(),
            _ => format!("{}.{apex}", self.slug),
        }
    }

    /// Description text, or a placeholder when none was given.
    #[must_use]
    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description,
            _ => "No description",
        }
    }
}

/// Insert payload for a new store.
///
/// Built from user input; the slug is derived from the name here and only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStore {
    pub user_id: UserId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub status: StoreStatus,
}

impl NewStore {
    /// Build an insert payload.
    ///
    /// Name and description are sent as typed; only an empty description
    /// becomes `null`. Status is always `active`.
    #[must_use]
    pub fn new(user_id: UserId, name: &str, description: Option<&str>) -> Self {
        let description = description
            .filter(|d| !d.is_empty())
            .map(ToString::to_string);

        Self {
            user_id,
            name: name.to_string(),
            slug: Slug::from_name(name),
            description,
            status: StoreStatus::Active,
        }
    }
}
