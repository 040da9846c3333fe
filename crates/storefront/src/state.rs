//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::BackendHandle;
use crate::config::StorefrontConfig;
use crate::sync::QueryClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The backend handle and query cache are
/// explicit values here rather than globals, so tests can build a state
/// around any backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    queries: QueryClient,
}

impl AppState {
    /// Create state over a backend handle that may not be connected yet.
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: BackendHandle) -> Self {
        let queries = QueryClient::new(backend, config.cache);
        Self {
            inner: Arc::new(AppStateInner { config, queries }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Cached reads and mutations.
    #[must_use]
    pub fn queries(&self) -> &QueryClient {
        &self.inner.queries
    }

    /// The backend connection handle.
    #[must_use]
    pub fn backend(&self) -> &BackendHandle {
        self.inner.queries.backend()
    }
}
