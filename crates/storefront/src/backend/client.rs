//! Marketplace backend client implementation.
//!
//! Uses `reqwest` for HTTP and `serde_json` for the argument and result
//! bodies. No caching happens here.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use handmade_market_core::{
    Category, CustomOrderRequest, Product, ProductId, Review, Shop, ShopId, UserProfile,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::{BackendError, OperationResult, Rejection};
use crate::config::BackendConfig;
use crate::models::Identity;

/// Maximum number of body characters echoed into logs and errors.
const BODY_PREVIEW_CHARS: usize = 200;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the marketplace backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
}

impl BackendClient {
    /// Create a client without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner { client, base_url }),
        })
    }

    /// Create a client and verify the backend answers its status probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or reports not ready.
    pub async fn connect(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Self::new(config)?;
        client.status().await?;
        Ok(client)
    }

    /// Probe `GET {backend}/status`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] on a non-success status.
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<(), BackendError> {
        let url = self.endpoint("status")?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!("status probe returned {status}")))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::Unavailable(format!("invalid backend path {path}: {e}")))
    }

    /// Execute an RPC call.
    async fn call<A, R>(
        &self,
        method: &str,
        args: &A,
        caller: Option<&Identity>,
    ) -> Result<R, BackendError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(&format!("rpc/{method}"))?;

        let mut request = self.inner.client.post(url).json(args);
        if let Some(identity) = caller {
            request = request.bearer_auth(identity.delegation());
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Rejection>(&body).map_or_else(
                |_| {
                    let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
                    format!("HTTP {status}: {preview}")
                },
                |rejection| rejection.message,
            );
            debug!(method, status = %status, message = %message, "Backend rejected call");
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                method,
                error = %e,
                body = %body.chars().take(BODY_PREVIEW_CHARS).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, BackendError> {
        self.call("getProducts", &json!({}), None).await
    }

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.call("getCategories", &json!({}), None).await
    }

    /// List every shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn get_shops(&self) -> Result<Vec<Shop>, BackendError> {
        self.call("getShops", &json!({}), None).await
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, search_text: &str) -> Result<Vec<Product>, BackendError> {
        self.call("searchProducts", &json!({ "searchText": search_text }), None)
            .await
    }

    /// Reviews left on a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_reviews_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, BackendError> {
        self.call(
            "getReviewsForProduct",
            &json!({ "productId": product_id }),
            None,
        )
        .await
    }

    // =========================================================================
    // Caller-scoped reads
    // =========================================================================

    /// Product IDs on the caller's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails; an anonymous caller gets an
    /// unauthorized rejection.
    #[instrument(skip(self, caller))]
    pub async fn get_my_wishlist(
        &self,
        caller: Option<&Identity>,
    ) -> Result<Vec<ProductId>, BackendError> {
        self.call("getMyWishlist", &json!({}), caller).await
    }

    /// Shop IDs the caller has marked as favourite.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller))]
    pub async fn get_my_favorites(
        &self,
        caller: Option<&Identity>,
    ) -> Result<Vec<ShopId>, BackendError> {
        self.call("getMyFavorites", &json!({}), caller).await
    }

    /// Custom order requests the caller has submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller))]
    pub async fn get_my_custom_orders(
        &self,
        caller: Option<&Identity>,
    ) -> Result<Vec<CustomOrderRequest>, BackendError> {
        self.call("getMyCustomOrders", &json!({}), caller).await
    }

    /// The caller's profile, `None` if they have not created one.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller))]
    pub async fn get_caller_user_profile(
        &self,
        caller: Option<&Identity>,
    ) -> Result<Option<UserProfile>, BackendError> {
        self.call("getCallerUserProfile", &json!({}), caller).await
    }

    // =========================================================================
    // Mutations (never cached)
    // =========================================================================

    /// Add a product to the caller's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        caller: &Identity,
        product_id: ProductId,
    ) -> Result<OperationResult, BackendError> {
        self.call("addToWishlist", &json!({ "productId": product_id }), Some(caller))
            .await
    }

    /// Remove a product from the caller's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        caller: &Identity,
        product_id: ProductId,
    ) -> Result<OperationResult, BackendError> {
        self.call(
            "removeFromWishlist",
            &json!({ "productId": product_id }),
            Some(caller),
        )
        .await
    }

    /// Mark a shop as favourite.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller), fields(shop_id = %shop_id))]
    pub async fn add_to_favorites(
        &self,
        caller: &Identity,
        shop_id: ShopId,
    ) -> Result<OperationResult, BackendError> {
        self.call("addToFavorites", &json!({ "shopId": shop_id }), Some(caller))
            .await
    }

    /// Unmark a favourite shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller), fields(shop_id = %shop_id))]
    pub async fn remove_from_favorites(
        &self,
        caller: &Identity,
        shop_id: ShopId,
    ) -> Result<OperationResult, BackendError> {
        self.call(
            "removeFromFavorites",
            &json!({ "shopId": shop_id }),
            Some(caller),
        )
        .await
    }

    /// Leave a review on a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller, comment, photos), fields(product_id = %product_id))]
    pub async fn add_review(
        &self,
        caller: &Identity,
        product_id: ProductId,
        rating: u64,
        comment: &str,
        photos: &[Vec<u8>],
    ) -> Result<OperationResult, BackendError> {
        let photos: Vec<String> = photos.iter().map(|p| STANDARD.encode(p)).collect();
        self.call(
            "addReview",
            &json!({
                "productId": product_id,
                "rating": rating,
                "comment": comment,
                "photos": photos,
            }),
            Some(caller),
        )
        .await
    }

    /// Ask a shop for a custom piece.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller, description), fields(shop_id = %shop_id))]
    pub async fn create_custom_order_request(
        &self,
        caller: &Identity,
        shop_id: ShopId,
        description: &str,
    ) -> Result<OperationResult, BackendError> {
        self.call(
            "createCustomOrderRequest",
            &json!({ "shopId": shop_id, "description": description }),
            Some(caller),
        )
        .await
    }

    /// Create or replace the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, caller, profile))]
    pub async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        self.call(
            "saveCallerUserProfile",
            &json!({ "profile": profile }),
            Some(caller),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: Url::parse(url).unwrap(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BackendClient::new(&config("http://localhost:4943/api")).unwrap();
        assert_eq!(
            client.endpoint("rpc/getProducts").unwrap().as_str(),
            "http://localhost:4943/api/rpc/getProducts"
        );
    }

    #[test]
    fn test_endpoint_root_base() {
        let client = BackendClient::new(&config("http://localhost:4943")).unwrap();
        assert_eq!(
            client.endpoint("status").unwrap().as_str(),
            "http://localhost:4943/status"
        );
    }

    #[tokio::test]
    async fn test_connect_unreachable_backend_fails() {
        // Port 9 (discard) is not an HTTP server
        let result = BackendClient::connect(&config("http://127.0.0.1:9")).await;
        assert!(result.is_err());
    }
}
