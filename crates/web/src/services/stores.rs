//! Store service.
//!
//! Lists and creates the signed-in user's stores and looks up their profile.
//! Profiles are cached for 5 minutes; stores are never cached so a newly
//! created store shows up on the next list.

use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use wozify_core::{NewStore, Profile, Store, UserId};

use crate::backend::{BackendError, DynBackend};
use crate::models::{AuthSession, profile_from_session};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Create form submitted without a name.
    #[error("Store name is required")]
    MissingName,

    /// Backend rejected the request or could not be reached.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl StoreError {
    /// Message rendered inline in the create-store modal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingName => self.to_string(),
            Self::Backend(e) => e.user_message(),
        }
    }
}

/// Create-store form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStoreForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CreateStoreForm {
    /// Whether the submit button is enabled.
    ///
    /// Disabled while the name is blank or a previous submission is in flight.
    #[must_use]
    pub fn can_submit(&self, in_flight: bool) -> bool {
        !in_flight && !self.name.trim().is_empty()
    }
}

/// Store service.
///
/// Cheap to clone; clones share the backend and the profile cache.
#[derive(Clone)]
pub struct StoreService {
    backend: DynBackend,
    profiles: Cache<UserId, Profile>,
}

impl StoreService {
    /// Create a new store service.
    #[must_use]
    pub fn new(backend: DynBackend) -> Self {
        let profiles = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self { backend, profiles }
    }

    /// All stores owned by the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the backend query fails.
    #[instrument(skip(self, auth), fields(user_id = %auth.user.id))]
    pub async fn list(&self, auth: &AuthSession) -> Result<Vec<Store>, StoreError> {
        let stores = self.backend.list_stores(auth).await?;
        debug!(count = stores.len(), "Loaded stores");
        Ok(stores)
    }

    /// Create a store from the submitted form.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingName` without contacting the backend if the
    /// name is blank, and `StoreError::Backend` if the insert fails.
    #[instrument(skip(self, auth, form), fields(user_id = %auth.user.id))]
    pub async fn create(&self, auth: &AuthSession, form: &CreateStoreForm) -> Result<(), StoreError> {
        if form.name.trim().is_empty() {
            return Err(StoreError::MissingName);
        }

        let store = NewStore::new(auth.user.id, &form.name, Some(&form.description));
        self.backend.insert_store(auth, &store).await?;

        tracing::info!(slug = %store.slug, "Store created");
        Ok(())
    }

    /// The signed-in user's profile.
    ///
    /// Falls back to the session user when the profile row is missing or the
    /// lookup fails, so the dashboard header always has something to show.
    #[instrument(skip(self, auth), fields(user_id = %auth.user.id))]
    pub async fn profile(&self, auth: &AuthSession) -> Profile {
        let user_id = auth.user.id;
        if let Some(profile) = self.profiles.get(&user_id).await {
            debug!("Cache hit for profile");
            return profile;
        }

        match self.backend.profile(auth).await {
            Ok(Some(profile)) => {
                self.profiles.insert(user_id, profile.clone()).await;
                profile
            }
            Ok(None) => profile_from_session(&auth.user),
            Err(e) => {
                tracing::warn!(error = %e, "Profile lookup failed, using session user");
                profile_from_session(&auth.user)
            }
        }
    }

    /// Drop a cached profile, e.g. on sign-out.
    pub async fn forget_profile(&self, user_id: UserId) {
        self.profiles.invalidate(&user_id).await;
    }
}
