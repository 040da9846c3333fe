//! Display data for templates and the view-local derivations behind it.
//!
//! Everything here is pure: handlers resolve queries through
//! [`crate::sync::QueryClient`] and hand the snapshots to these functions.

use handmade_market_core::{
    Category, CustomOrderRequest, Product, ProductId, Review, Shop, ShopId, average_rating,
};

/// Number of products shown on the home page.
pub const FEATURED_PRODUCTS: usize = 8;

/// Number of shops shown on the home page.
pub const FEATURED_SHOPS: usize = 3;

/// Tags shown on a product card.
const CARD_TAGS: usize = 2;

/// Stars in the rating display.
pub const MAX_STARS: u64 = 5;

/// Product summary for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            tags: product.tags.iter().take(CARD_TAGS).cloned().collect(),
            price: product.price.display(),
            image_url: product.image_url(),
        }
    }
}

/// Full product display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    pub description: String,
    pub story: Option<String>,
    pub tags: Vec<String>,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            shop_id: product.shop_id,
            name: product.name.clone(),
            description: product.description.clone(),
            story: product.story.clone().filter(|s| !s.trim().is_empty()),
            tags: product.tags.clone(),
            price: product.price.display(),
            image_url: product.image_url(),
        }
    }
}

#[derive(Clone)]
pub struct ShopView {
    pub id: ShopId,
    pub name: String,
    pub description: String,
    pub announcements: Vec<String>,
}

impl From<&Shop> for ShopView {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            description: shop.description.clone(),
            announcements: shop.announcements.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ReviewView {
    pub rating: u64,
    pub date: String,
    pub comment: String,
    pub photo_urls: Vec<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            rating: review.rating,
            date: review
                .created_at()
                .map(|t| t.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
            comment: review.comment.clone(),
            photo_urls: review.photo_urls(),
        }
    }
}

/// Aggregate shown above the review list.
#[derive(Clone)]
pub struct ReviewSummary {
    /// Average rounded to the nearest whole star.
    pub stars: u64,
    /// e.g. `4.5 out of 5 (2 reviews)`
    pub label: String,
}

/// Summary for a review list, `None` when there are no reviews.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss // averages of u64 ratings are non-negative
)]
pub fn review_summary(reviews: &[Review]) -> Option<ReviewSummary> {
    let average = average_rating(reviews)?;
    Some(ReviewSummary {
        stars: average.round() as u64,
        label: format!(
            "{average:.1} out of 5 ({})",
            pluralize(reviews.len(), "review", "reviews")
        ),
    })
}

#[derive(Clone)]
pub struct CustomOrderView {
    pub id: String,
    pub shop_id: ShopId,
    pub shop_name: Option<String>,
    pub description: String,
    pub status: String,
    pub open: bool,
    pub date: String,
}

impl CustomOrderView {
    #[must_use]
    pub fn new(order: &CustomOrderRequest, shops: &[Shop]) -> Self {
        let status = order.status();
        Self {
            id: order.id.to_string(),
            shop_id: order.shop_id,
            shop_name: find_shop(shops, order.shop_id).map(|s| s.name.clone()),
            description: order.description.clone(),
            status: status.label().to_string(),
            open: status.is_open(),
            date: chrono::DateTime::from_timestamp(order.timestamp.div_euclid(1_000_000_000), 0)
                .map(|t| t.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// Derivations
// =============================================================================

/// Products tagged with the category's name (exact, case-sensitive).
#[must_use]
pub fn products_in_category<'a>(products: &'a [Product], category: &Category) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.has_tag(&category.name))
        .collect()
}

/// Products listed by a shop.
#[must_use]
pub fn products_in_shop(products: &[Product], shop_id: ShopId) -> Vec<&Product> {
    products.iter().filter(|p| p.shop_id == shop_id).collect()
}

/// Products whose IDs are on the wishlist, in catalog order.
///
/// IDs without a matching product are dropped.
#[must_use]
pub fn products_in_wishlist<'a>(
    products: &'a [Product],
    wishlist: &[ProductId],
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| wishlist.contains(&p.id))
        .collect()
}

#[must_use]
pub fn find_product(products: &[Product], id: ProductId) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

#[must_use]
pub fn find_shop(shops: &[Shop], id: ShopId) -> Option<&Shop> {
    shops.iter().find(|s| s.id == id)
}

#[must_use]
pub fn find_category(
    categories: &[Category],
    id: handmade_market_core::CategoryId,
) -> Option<&Category> {
    categories.iter().find(|c| c.id == id)
}

/// `1 item` / `3 items`.
#[must_use]
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Card views for a slice of product references.
#[must_use]
pub fn cards(products: &[&Product]) -> Vec<ProductCardView> {
    products.iter().map(|p| ProductCardView::from(*p)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use handmade_market_core::{CategoryId, Price, Principal, ReviewId};

    use super::*;

    fn product(id: u64, shop: u64, tags: &[&str]) -> Product {
        Product {
            id: ProductId::new(id),
            shop_id: ShopId::new(shop),
            name: format!("Product {id}"),
            tags: tags.iter().map(ToString::to_string).collect(),
            description: String::new(),
            story: None,
            image: None,
            price: Price::from_minor_units(2500),
        }
    }

    fn review(rating: u64) -> Review {
        Review {
            id: ReviewId::new(rating),
            user_id: Principal::parse("alice").unwrap(),
            product_id: ProductId::new(1),
            comment: "Nice".to_string(),
            timestamp: 1_700_000_000_000_000_000,
            rating,
            photos: Vec::new(),
        }
    }

    #[test]
    fn test_category_filter_is_exact_and_case_sensitive() {
        let products = vec![
            product(1, 1, &["Ceramics", "Handmade"]),
            product(2, 1, &["Textiles"]),
            product(3, 1, &["ceramics"]),
        ];
        let category = Category {
            id: CategoryId::new(1),
            name: "Ceramics".to_string(),
        };
        let ids: Vec<u64> = products_in_category(&products, &category)
            .iter()
            .map(|p| p.id.as_u64())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_shop_and_wishlist_filters() {
        let products = vec![product(1, 1, &[]), product(2, 2, &[]), product(3, 1, &[])];
        assert_eq!(products_in_shop(&products, ShopId::new(1)).len(), 2);

        let wishlist = vec![ProductId::new(3), ProductId::new(99)];
        let saved = products_in_wishlist(&products, &wishlist);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, ProductId::new(3));
    }

    #[test]
    fn test_review_summary() {
        assert!(review_summary(&[]).is_none());

        let summary = review_summary(&[review(5), review(4)]).unwrap();
        assert_eq!(summary.label, "4.5 out of 5 (2 reviews)");
        assert_eq!(summary.stars, 5);

        let summary = review_summary(&[review(3)]).unwrap();
        assert_eq!(summary.label, "3.0 out of 5 (1 review)");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "item", "items"), "0 items");
        assert_eq!(pluralize(1, "item", "items"), "1 item");
        assert_eq!(pluralize(2, "item", "items"), "2 items");
    }

    #[test]
    fn test_card_view() {
        let card = ProductCardView::from(&product(1, 1, &["a", "b", "c"]));
        assert_eq!(card.tags, vec!["a", "b"]);
        assert_eq!(card.price, "$25.00");
        assert!(card.image_url.is_none());
    }

    #[test]
    fn test_review_date() {
        let view = ReviewView::from(&review(4));
        assert_eq!(view.date, "Nov 14, 2023");
    }
}
