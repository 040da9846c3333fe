//! Remote access layer for the marketplace backend.
//!
//! # Architecture
//!
//! - One typed async method per backend capability on [`BackendClient`]
//! - JSON over HTTP: `POST {backend}/rpc/{method}` with named arguments
//! - The backend is source of truth - NO local persistence
//! - Caching lives one layer up, in [`crate::sync`]
//!
//! # Errors
//!
//! A non-2xx response is a *rejection* carrying the backend's message.
//! Caller-scoped reads made without a valid identity are rejected with a
//! message containing `Unauthorized`; [`BackendError::is_unauthorized`]
//! recognises that condition so the synchronization layer can treat it as
//! absence rather than failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use handmade_market_storefront::backend::BackendClient;
//!
//! let client = BackendClient::connect(&config.backend).await?;
//! let products = client.get_products().await?;
//! let wishlist = client.get_my_wishlist(Some(&identity)).await?;
//! ```

mod client;
mod handle;
pub mod types;

pub use client::BackendClient;
pub use handle::BackendHandle;
pub use types::*;

use thiserror::Error;

/// Substring the backend uses for caller-scoped access without an identity.
pub const UNAUTHORIZED_MARKER: &str = "Unauthorized";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the call.
    #[error("{message}")]
    Rejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Message reported by the backend.
        message: String,
    },

    /// Response body did not match the expected contract.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend is not reachable or not ready yet.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether this is the "caller has no identity" rejection.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { message, .. } if message.contains(UNAUTHORIZED_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection_by_message() {
        let err = BackendError::Rejected {
            status: 403,
            message: "Unauthorized: Only users can view their wishlist".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = BackendError::Rejected {
            status: 500,
            message: "Product not found".to_string(),
        };
        assert!(!err.is_unauthorized());

        let err = BackendError::Unavailable("Unauthorized".to_string());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_rejection_displays_backend_message() {
        let err = BackendError::Rejected {
            status: 400,
            message: "Shop does not exist".to_string(),
        };
        assert_eq!(err.to_string(), "Shop does not exist");
    }
}
