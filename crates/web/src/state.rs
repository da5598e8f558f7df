//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::DynBackend;
use crate::config::WebConfig;
use crate::services::{AuthService, StoreService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the backend and the services built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    backend: DynBackend,
    auth: AuthService,
    stores: StoreService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: WebConfig, backend: DynBackend) -> Self {
        let auth = AuthService::new(backend.clone());
        let stores = StoreService::new(backend.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                auth,
                stores,
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &DynBackend {
        &self.inner.backend
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the store service.
    #[must_use]
    pub fn stores(&self) -> &StoreService {
        &self.inner.stores
    }
}
