//! Application state shared across handlers.

use std::sync::Arc;

use doux_core::VisitorId;

use crate::backend::{ApiError, BackendClient};
use crate::config::StorefrontConfig;
use crate::search::Debouncer;
use crate::services::CartStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns every piece of
/// process-wide state: the backend client with its catalog cache, the cart
/// store, and the search debouncer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    carts: CartStore,
    debouncer: Debouncer<VisitorId>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let backend = BackendClient::new(&config.backend)?;
        let debouncer = Debouncer::new(config.search_debounce);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                carts: CartStore::default(),
                debouncer,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the per-visitor cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Get a reference to the search debouncer.
    #[must_use]
    pub fn debouncer(&self) -> &Debouncer<VisitorId> {
        &self.inner.debouncer
    }
}
