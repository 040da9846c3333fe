//! Query keys and cached values.

use std::sync::Arc;

use handmade_market_core::{
    Category, CustomOrderRequest, Principal, Product, ProductId, Review, Shop, ShopId, UserProfile,
};

/// Identity of a cached read.
///
/// Caller-scoped keys carry the caller's principal (`None` for anonymous)
/// so one caller never sees another caller's cached data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum QueryKey {
    Products,
    Categories,
    Shops,
    ProductSearch(String),
    Reviews(ProductId),
    Wishlist(Option<Principal>),
    Favorites(Option<Principal>),
    CustomOrders(Option<Principal>),
    CurrentUserProfile(Option<Principal>),
}

/// Discriminant of [`QueryKey`], used where parameters are not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Products,
    Categories,
    Shops,
    ProductSearch,
    Reviews,
    Wishlist,
    Favorites,
    CustomOrders,
    CurrentUserProfile,
}

impl QueryKey {
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Products => QueryKind::Products,
            Self::Categories => QueryKind::Categories,
            Self::Shops => QueryKind::Shops,
            Self::ProductSearch(_) => QueryKind::ProductSearch,
            Self::Reviews(_) => QueryKind::Reviews,
            Self::Wishlist(_) => QueryKind::Wishlist,
            Self::Favorites(_) => QueryKind::Favorites,
            Self::CustomOrders(_) => QueryKind::CustomOrders,
            Self::CurrentUserProfile(_) => QueryKind::CurrentUserProfile,
        }
    }

    /// The principal a caller-scoped key belongs to.
    #[must_use]
    pub const fn caller(&self) -> Option<&Principal> {
        match self {
            Self::Wishlist(caller)
            | Self::Favorites(caller)
            | Self::CustomOrders(caller)
            | Self::CurrentUserProfile(caller) => caller.as_ref(),
            _ => None,
        }
    }
}

/// A cached query result.
///
/// Payloads sit behind `Arc` so cache hits are cheap clones.
#[derive(Debug, Clone)]
pub enum QueryValue {
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
    Shops(Arc<Vec<Shop>>),
    Reviews(Arc<Vec<Review>>),
    ProductIds(Arc<Vec<ProductId>>),
    ShopIds(Arc<Vec<ShopId>>),
    CustomOrders(Arc<Vec<CustomOrderRequest>>),
    Profile(Option<Arc<UserProfile>>),
}

impl QueryValue {
    pub(crate) fn into_products(self) -> Option<Arc<Vec<Product>>> {
        match self {
            Self::Products(products) => Some(products),
            _ => None,
        }
    }

    pub(crate) fn into_categories(self) -> Option<Arc<Vec<Category>>> {
        match self {
            Self::Categories(categories) => Some(categories),
            _ => None,
        }
    }

    pub(crate) fn into_shops(self) -> Option<Arc<Vec<Shop>>> {
        match self {
            Self::Shops(shops) => Some(shops),
            _ => None,
        }
    }

    pub(crate) fn into_reviews(self) -> Option<Arc<Vec<Review>>> {
        match self {
            Self::Reviews(reviews) => Some(reviews),
            _ => None,
        }
    }

    pub(crate) fn into_product_ids(self) -> Option<Arc<Vec<ProductId>>> {
        match self {
            Self::ProductIds(ids) => Some(ids),
            _ => None,
        }
    }

    pub(crate) fn into_shop_ids(self) -> Option<Arc<Vec<ShopId>>> {
        match self {
            Self::ShopIds(ids) => Some(ids),
            _ => None,
        }
    }

    pub(crate) fn into_custom_orders(self) -> Option<Arc<Vec<CustomOrderRequest>>> {
        match self {
            Self::CustomOrders(orders) => Some(orders),
            _ => None,
        }
    }

    pub(crate) fn into_profile(self) -> Option<Option<Arc<UserProfile>>> {
        match self {
            Self::Profile(profile) => Some(profile),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_scoped_keys_differ_per_caller() {
        let alice = Principal::parse("alice").unwrap();
        let bob = Principal::parse("bob").unwrap();
        assert_ne!(
            QueryKey::Wishlist(Some(alice.clone())),
            QueryKey::Wishlist(Some(bob))
        );
        assert_ne!(QueryKey::Wishlist(Some(alice)), QueryKey::Wishlist(None));
    }

    #[test]
    fn test_caller() {
        let alice = Principal::parse("alice").unwrap();
        assert_eq!(
            QueryKey::Favorites(Some(alice.clone())).caller(),
            Some(&alice)
        );
        assert_eq!(QueryKey::Products.caller(), None);
        assert_eq!(QueryKey::Reviews(ProductId::new(1)).caller(), None);
    }

    #[test]
    fn test_value_accessors_reject_other_variants() {
        let value = QueryValue::Products(Arc::new(Vec::new()));
        assert!(value.clone().into_products().is_some());
        assert!(value.into_reviews().is_none());
    }
}
