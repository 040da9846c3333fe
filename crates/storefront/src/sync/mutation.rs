//! Mutations and the queries they invalidate.

use handmade_market_core::{Principal, ProductId, Rating, ShopId, UserProfile};

use super::key::{QueryKey, QueryKind};

/// A write against the backend.
#[derive(Debug, Clone)]
pub enum Mutation {
    SaveProfile(UserProfile),
    AddToWishlist(ProductId),
    RemoveFromWishlist(ProductId),
    AddToFavorites(ShopId),
    RemoveFromFavorites(ShopId),
    AddReview {
        product_id: ProductId,
        rating: Rating,
        comment: String,
        photos: Vec<Vec<u8>>,
    },
    CreateCustomOrder {
        shop_id: ShopId,
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    SaveProfile,
    AddToWishlist,
    RemoveFromWishlist,
    AddToFavorites,
    RemoveFromFavorites,
    AddReview,
    CreateCustomOrder,
}

/// Query kinds made stale by each successful mutation.
///
/// Kinds are bound to concrete keys with the mutation's parameters and the
/// caller's principal.
pub const INVALIDATION_TABLE: &[(MutationKind, &[QueryKind])] = &[
    (MutationKind::SaveProfile, &[QueryKind::CurrentUserProfile]),
    (MutationKind::AddToWishlist, &[QueryKind::Wishlist]),
    (MutationKind::RemoveFromWishlist, &[QueryKind::Wishlist]),
    (MutationKind::AddToFavorites, &[QueryKind::Favorites]),
    (MutationKind::RemoveFromFavorites, &[QueryKind::Favorites]),
    (MutationKind::AddReview, &[QueryKind::Reviews]),
    (MutationKind::CreateCustomOrder, &[QueryKind::CustomOrders]),
];

impl Mutation {
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::SaveProfile(_) => MutationKind::SaveProfile,
            Self::AddToWishlist(_) => MutationKind::AddToWishlist,
            Self::RemoveFromWishlist(_) => MutationKind::RemoveFromWishlist,
            Self::AddToFavorites(_) => MutationKind::AddToFavorites,
            Self::RemoveFromFavorites(_) => MutationKind::RemoveFromFavorites,
            Self::AddReview { .. } => MutationKind::AddReview,
            Self::CreateCustomOrder { .. } => MutationKind::CreateCustomOrder,
        }
    }

    const fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::AddToWishlist(id) | Self::RemoveFromWishlist(id) => Some(*id),
            Self::AddReview { product_id, .. } => Some(*product_id),
            _ => None,
        }
    }

    /// Concrete keys to invalidate after this mutation succeeds for `caller`.
    #[must_use]
    pub fn invalidated_keys(&self, caller: &Principal) -> Vec<QueryKey> {
        let kind = self.kind();
        INVALIDATION_TABLE
            .iter()
            .filter(|(mutation, _)| *mutation == kind)
            .flat_map(|(_, queries)| queries.iter())
            .filter_map(|query| self.bind(*query, caller))
            .collect()
    }

    fn bind(&self, query: QueryKind, caller: &Principal) -> Option<QueryKey> {
        let caller = Some(caller.clone());
        match query {
            QueryKind::Products => Some(QueryKey::Products),
            QueryKind::Categories => Some(QueryKey::Categories),
            QueryKind::Shops => Some(QueryKey::Shops),
            QueryKind::Reviews => self.product_id().map(QueryKey::Reviews),
            QueryKind::Wishlist => Some(QueryKey::Wishlist(caller)),
            QueryKind::Favorites => Some(QueryKey::Favorites(caller)),
            QueryKind::CustomOrders => Some(QueryKey::CustomOrders(caller)),
            QueryKind::CurrentUserProfile => Some(QueryKey::CurrentUserProfile(caller)),
            // Search results are keyed by free text and cannot be bound.
            QueryKind::ProductSearch => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal::parse("alice").unwrap()
    }

    #[test]
    fn test_every_mutation_kind_has_an_entry() {
        let kinds = [
            MutationKind::SaveProfile,
            MutationKind::AddToWishlist,
            MutationKind::RemoveFromWishlist,
            MutationKind::AddToFavorites,
            MutationKind::RemoveFromFavorites,
            MutationKind::AddReview,
            MutationKind::CreateCustomOrder,
        ];
        for kind in kinds {
            assert!(
                INVALIDATION_TABLE.iter().any(|(k, _)| *k == kind),
                "missing invalidation entry for {kind:?}"
            );
        }
    }

    #[test]
    fn test_review_invalidates_only_that_product() {
        let mutation = Mutation::AddReview {
            product_id: ProductId::new(7),
            rating: Rating::new(4).unwrap(),
            comment: "Lovely glaze".to_string(),
            photos: Vec::new(),
        };
        assert_eq!(
            mutation.invalidated_keys(&alice()),
            vec![QueryKey::Reviews(ProductId::new(7))]
        );
    }

    #[test]
    fn test_wishlist_invalidates_caller_wishlist() {
        let keys = Mutation::RemoveFromWishlist(ProductId::new(1)).invalidated_keys(&alice());
        assert_eq!(keys, vec![QueryKey::Wishlist(Some(alice()))]);
    }

    #[test]
    fn test_profile_and_orders_are_caller_scoped() {
        let keys = Mutation::SaveProfile(UserProfile::default()).invalidated_keys(&alice());
        assert_eq!(keys, vec![QueryKey::CurrentUserProfile(Some(alice()))]);

        let keys = Mutation::CreateCustomOrder {
            shop_id: ShopId::new(3),
            description: "A blue mug".to_string(),
        }
        .invalidated_keys(&alice());
        assert_eq!(keys, vec![QueryKey::CustomOrders(Some(alice()))]);
    }

    #[test]
    fn test_favorites_invalidation() {
        let keys = Mutation::AddToFavorites(ShopId::new(2)).invalidated_keys(&alice());
        assert_eq!(keys, vec![QueryKey::Favorites(Some(alice()))]);
    }
}
