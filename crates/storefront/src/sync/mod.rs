//! Synchronization layer: cached reads and invalidating mutations.
//!
//! # Architecture
//!
//! - Every read goes through [`QueryClient`], keyed by [`QueryKey`]
//! - `moka` coalesces concurrent loads of one key into a single backend call
//! - Failed loads are not cached; the next read tries again
//! - A load that overlaps any invalidation drops its own result from the
//!   cache once it lands, so a read started before a mutation never leaves
//!   a pre-mutation value behind
//! - Mutations are never cached; on success they invalidate exactly the keys
//!   listed for them in [`INVALIDATION_TABLE`]
//!
//! Caller-scoped reads (profile, wishlist, favourites, custom orders) treat
//! an unauthorized rejection as "nothing there" rather than an error.

mod key;
mod mutation;
mod state;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use handmade_market_core::{
    Category, CustomOrderRequest, Principal, Product, ProductId, Review, Shop, ShopId, UserProfile,
};
use moka::future::Cache;
use tracing::{debug, instrument, warn};

pub use key::{QueryKey, QueryKind, QueryValue};
pub use mutation::{INVALIDATION_TABLE, Mutation, MutationKind};
pub use state::{MutationError, QueryError, QueryState};

use crate::backend::{BackendClient, BackendError, BackendHandle, OperationResult};
use crate::config::CacheConfig;
use crate::models::Identity;

/// Cached, deduplicating access to backend reads and mutations.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<QueryClientInner>,
}

struct QueryClientInner {
    backend: BackendHandle,
    cache: Cache<QueryKey, QueryValue>,
    /// Bumped before every invalidation.
    epoch: AtomicU64,
}

impl QueryClient {
    /// Create a query client over a (possibly not yet connected) backend.
    #[must_use]
    pub fn new(backend: BackendHandle, config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            inner: Arc::new(QueryClientInner {
                backend,
                cache,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &BackendHandle {
        &self.inner.backend
    }

    /// Resolve a key, loading it if missing or when `refetch` is set.
    #[instrument(skip(self, caller))]
    pub async fn query(
        &self,
        key: QueryKey,
        caller: Option<&Identity>,
        refetch: bool,
    ) -> QueryState<QueryValue> {
        let Some(client) = self.inner.backend.get() else {
            debug!("Backend not ready, query disabled");
            return QueryState::Disabled;
        };

        if refetch {
            self.advance_epoch();
        }
        let started = self.inner.epoch.load(Ordering::SeqCst);

        let result = if refetch {
            self.reload(client, &key, caller).await
        } else {
            let init = load(client, key.clone(), caller);
            self.inner.cache.try_get_with(key.clone(), init).await
        };

        // Anything this load cached may predate an invalidation that ran meanwhile
        if self.inner.epoch.load(Ordering::SeqCst) != started {
            debug!(?key, "Invalidated while loading, dropping loaded value");
            self.inner.cache.invalidate(&key).await;
        }

        match result {
            Ok(value) => QueryState::Success(value),
            Err(e) => {
                warn!(error = %e, "Query failed");
                QueryState::Error(QueryError::Backend(e))
            }
        }
    }

    /// Load `key` without joining an in-flight load, replacing any cached value.
    async fn reload(
        &self,
        client: &BackendClient,
        key: &QueryKey,
        caller: Option<&Identity>,
    ) -> Result<QueryValue, Arc<BackendError>> {
        match load(client, key.clone(), caller).await {
            Ok(value) => {
                self.inner.cache.insert(key.clone(), value.clone()).await;
                Ok(value)
            }
            Err(e) => {
                self.inner.cache.invalidate(key).await;
                Err(Arc::new(e))
            }
        }
    }

    fn advance_epoch(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
    }

    async fn typed<T>(
        &self,
        key: QueryKey,
        caller: Option<&Identity>,
        refetch: bool,
        extract: fn(QueryValue) -> Option<T>,
    ) -> QueryState<T> {
        let kind = key.kind();
        match self.query(key, caller, refetch).await {
            QueryState::Disabled => QueryState::Disabled,
            QueryState::Error(e) => QueryState::Error(e),
            QueryState::Success(value) => extract(value)
                .map_or(QueryState::Error(QueryError::Mismatch(kind)), QueryState::Success),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn products(&self, refetch: bool) -> QueryState<Arc<Vec<Product>>> {
        self.typed(QueryKey::Products, None, refetch, QueryValue::into_products)
            .await
    }

    pub async fn categories(&self, refetch: bool) -> QueryState<Arc<Vec<Category>>> {
        self.typed(QueryKey::Categories, None, refetch, QueryValue::into_categories)
            .await
    }

    pub async fn shops(&self, refetch: bool) -> QueryState<Arc<Vec<Shop>>> {
        self.typed(QueryKey::Shops, None, refetch, QueryValue::into_shops)
            .await
    }

    pub async fn search(&self, text: &str, refetch: bool) -> QueryState<Arc<Vec<Product>>> {
        let key = QueryKey::ProductSearch(text.trim().to_string());
        self.typed(key, None, refetch, QueryValue::into_products)
            .await
    }

    pub async fn reviews(
        &self,
        product_id: ProductId,
        refetch: bool,
    ) -> QueryState<Arc<Vec<Review>>> {
        self.typed(
            QueryKey::Reviews(product_id),
            None,
            refetch,
            QueryValue::into_reviews,
        )
        .await
    }

    /// Product IDs on the caller's wishlist; empty for anonymous callers.
    pub async fn wishlist(
        &self,
        caller: Option<&Identity>,
        refetch: bool,
    ) -> QueryState<Arc<Vec<ProductId>>> {
        let key = QueryKey::Wishlist(principal_of(caller));
        self.typed(key, caller, refetch, QueryValue::into_product_ids)
            .await
    }

    /// Shop IDs the caller favours; empty for anonymous callers.
    pub async fn favorites(
        &self,
        caller: Option<&Identity>,
        refetch: bool,
    ) -> QueryState<Arc<Vec<ShopId>>> {
        let key = QueryKey::Favorites(principal_of(caller));
        self.typed(key, caller, refetch, QueryValue::into_shop_ids)
            .await
    }

    pub async fn custom_orders(
        &self,
        caller: Option<&Identity>,
        refetch: bool,
    ) -> QueryState<Arc<Vec<CustomOrderRequest>>> {
        let key = QueryKey::CustomOrders(principal_of(caller));
        self.typed(key, caller, refetch, QueryValue::into_custom_orders)
            .await
    }

    /// The caller's profile; `None` when anonymous or not created yet.
    pub async fn current_user_profile(
        &self,
        caller: Option<&Identity>,
        refetch: bool,
    ) -> QueryState<Option<Arc<UserProfile>>> {
        let key = QueryKey::CurrentUserProfile(principal_of(caller));
        self.typed(key, caller, refetch, QueryValue::into_profile)
            .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Run a mutation and invalidate the queries it makes stale.
    ///
    /// # Errors
    ///
    /// - [`MutationError::Disabled`] if the backend is not connected
    /// - [`MutationError::Failed`] if the backend reported a failure message
    /// - [`MutationError::Transport`] if the call failed or was rejected
    #[instrument(
        skip(self, caller, mutation),
        fields(kind = ?mutation.kind(), caller = %caller.principal)
    )]
    pub async fn mutate(
        &self,
        caller: &Identity,
        mutation: Mutation,
    ) -> Result<OperationResult, MutationError> {
        let client = self.inner.backend.get().ok_or(MutationError::Disabled)?;
        let result = send(client, caller, &mutation).await?;

        if let Some(message) = result.failure() {
            warn!(message, "Mutation reported failure");
            return Err(MutationError::Failed(message.to_string()));
        }

        self.advance_epoch();
        for key in mutation.invalidated_keys(&caller.principal) {
            debug!(?key, "Invalidating query");
            self.inner.cache.invalidate(&key).await;
        }

        Ok(result)
    }

    /// Drop every cached entry scoped to `principal`.
    pub async fn clear_caller(&self, principal: &Principal) {
        let stale: Vec<QueryKey> = self
            .inner
            .cache
            .iter()
            .filter(|(key, _)| key.caller() == Some(principal))
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();

        debug!(count = stale.len(), "Clearing caller-scoped queries");
        self.advance_epoch();
        for key in stale {
            self.inner.cache.invalidate(&key).await;
        }
    }
}

fn principal_of(caller: Option<&Identity>) -> Option<Principal> {
    caller.map(|identity| identity.principal.clone())
}

/// Fetch the value for `key` from the backend.
async fn load(
    client: &BackendClient,
    key: QueryKey,
    caller: Option<&Identity>,
) -> Result<QueryValue, BackendError> {
    debug!(?key, "Loading query from backend");
    let value = match key {
        QueryKey::Products => QueryValue::Products(Arc::new(client.get_products().await?)),
        QueryKey::Categories => QueryValue::Categories(Arc::new(client.get_categories().await?)),
        QueryKey::Shops => QueryValue::Shops(Arc::new(client.get_shops().await?)),
        QueryKey::ProductSearch(text) => {
            QueryValue::Products(Arc::new(client.search_products(&text).await?))
        }
        QueryKey::Reviews(product_id) => {
            QueryValue::Reviews(Arc::new(client.get_reviews_for_product(product_id).await?))
        }
        QueryKey::Wishlist(_) => QueryValue::ProductIds(Arc::new(
            absent_if_unauthorized(client.get_my_wishlist(caller)).await?,
        )),
        QueryKey::Favorites(_) => QueryValue::ShopIds(Arc::new(
            absent_if_unauthorized(client.get_my_favorites(caller)).await?,
        )),
        QueryKey::CustomOrders(_) => QueryValue::CustomOrders(Arc::new(
            absent_if_unauthorized(client.get_my_custom_orders(caller)).await?,
        )),
        QueryKey::CurrentUserProfile(_) => QueryValue::Profile(
            absent_if_unauthorized(client.get_caller_user_profile(caller))
                .await?
                .map(Arc::new),
        ),
    };
    Ok(value)
}

/// Map an unauthorized rejection to the empty value.
async fn absent_if_unauthorized<T: Default>(
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    match call.await {
        Err(e) if e.is_unauthorized() => {
            debug!(error = %e, "Unauthorized caller-scoped read, treating as empty");
            Ok(T::default())
        }
        other => other,
    }
}

/// Dispatch a mutation to its backend call.
async fn send(
    client: &BackendClient,
    caller: &Identity,
    mutation: &Mutation,
) -> Result<OperationResult, BackendError> {
    match mutation {
        Mutation::SaveProfile(profile) => client
            .save_caller_user_profile(caller, profile)
            .await
            .map(|()| OperationResult::ok()),
        Mutation::AddToWishlist(id) => client.add_to_wishlist(caller, *id).await,
        Mutation::RemoveFromWishlist(id) => client.remove_from_wishlist(caller, *id).await,
        Mutation::AddToFavorites(id) => client.add_to_favorites(caller, *id).await,
        Mutation::RemoveFromFavorites(id) => client.remove_from_favorites(caller, *id).await,
        Mutation::AddReview {
            product_id,
            rating,
            comment,
            photos,
        } => {
            client
                .add_review(caller, *product_id, rating.value(), comment, photos)
                .await
        }
        Mutation::CreateCustomOrder {
            shop_id,
            description,
        } => {
            client
                .create_custom_order_request(caller, *shop_id, description)
                .await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::BackendConfig;

    fn offline_client() -> QueryClient {
        let config = BackendConfig {
            url: Url::parse("http://127.0.0.1:9").unwrap(),
            timeout: Duration::from_millis(200),
        };
        QueryClient::new(BackendHandle::new(config), CacheConfig::default())
    }

    fn identity() -> Identity {
        Identity::new(Principal::parse("alice").unwrap(), "delegation".to_string())
    }

    #[tokio::test]
    async fn test_reads_disabled_until_backend_ready() {
        let client = offline_client();
        assert!(client.products(false).await.is_disabled());
        assert!(client.wishlist(Some(&identity()), false).await.is_disabled());
        assert!(client.current_user_profile(None, true).await.is_disabled());
    }

    #[tokio::test]
    async fn test_mutations_disabled_until_backend_ready() {
        let client = offline_client();
        let err = client
            .mutate(&identity(), Mutation::AddToWishlist(ProductId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Disabled));
    }

    #[tokio::test]
    async fn test_absent_if_unauthorized() {
        let rejected = async {
            Err::<Vec<ProductId>, _>(BackendError::Rejected {
                status: 403,
                message: "Unauthorized: Only users can view their wishlist".to_string(),
            })
        };
        assert!(absent_if_unauthorized(rejected).await.unwrap().is_empty());

        let failed = async {
            Err::<Vec<ProductId>, _>(BackendError::Rejected {
                status: 500,
                message: "internal error".to_string(),
            })
        };
        assert!(absent_if_unauthorized(failed).await.is_err());
    }
}
