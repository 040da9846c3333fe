//! Lazily initialized backend connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use super::{BackendClient, BackendError};
use crate::config::BackendConfig;

/// Delay between connection attempts made by [`BackendHandle::spawn_connect`].
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Handle to the backend client, usable before the backend is reachable.
///
/// Reads check [`get`](Self::get) and are not issued while it returns `None`.
#[derive(Clone)]
pub struct BackendHandle {
    inner: Arc<BackendHandleInner>,
}

struct BackendHandleInner {
    config: BackendConfig,
    cell: OnceCell<BackendClient>,
}

impl BackendHandle {
    /// Create a handle that connects on first [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            inner: Arc::new(BackendHandleInner {
                config,
                cell: OnceCell::new(),
            }),
        }
    }

    /// Create a handle around an already connected client.
    #[must_use]
    pub fn ready(config: BackendConfig, client: BackendClient) -> Self {
        Self {
            inner: Arc::new(BackendHandleInner {
                config,
                cell: OnceCell::from(client),
            }),
        }
    }

    /// The client, if the connection has been established.
    #[must_use]
    pub fn get(&self) -> Option<&BackendClient> {
        self.inner.cell.get()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.cell.initialized()
    }

    /// Connect if not connected yet. Concurrent callers share one attempt.
    ///
    /// # Errors
    ///
    /// Returns the connection error; a later call tries again.
    pub async fn connect(&self) -> Result<&BackendClient, BackendError> {
        self.inner
            .cell
            .get_or_try_init(|| BackendClient::connect(&self.inner.config))
            .await
    }

    /// Keep trying to connect in the background until it succeeds.
    pub fn spawn_connect(&self) -> tokio::task::JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            loop {
                match handle.connect().await {
                    Ok(_) => {
                        tracing::info!(
                            backend = %handle.inner.config.url,
                            "Backend connection ready"
                        );
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Backend not ready, retrying");
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;

    fn config() -> BackendConfig {
        BackendConfig {
            url: Url::parse("http://127.0.0.1:9").unwrap(),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_new_handle_is_not_ready() {
        let handle = BackendHandle::new(config());
        assert!(!handle.is_ready());
        assert!(handle.get().is_none());
    }

    #[test]
    fn test_ready_handle() {
        let client = BackendClient::new(&config()).unwrap();
        let handle = BackendHandle::ready(config(), client);
        assert!(handle.is_ready());
        assert!(handle.get().is_some());
    }

    #[tokio::test]
    async fn test_failed_connect_stays_not_ready() {
        let handle = BackendHandle::new(config());
        assert!(handle.connect().await.is_err());
        assert!(!handle.is_ready());
    }
}
