//! Application state shared across handlers.

use std::sync::Arc;

use crate::checkout::InFlightSubmissions;
use crate::config::StorefrontConfig;
use crate::store::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the data store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    in_flight: InFlightSubmissions,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Data store (`PgStore` in production)
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                in_flight: InFlightSubmissions::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the data store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// The process-wide registry of running order submissions.
    #[must_use]
    pub fn in_flight(&self) -> &InFlightSubmissions {
        &self.inner.in_flight
    }
}
