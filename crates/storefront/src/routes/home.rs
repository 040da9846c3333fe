//! Home page: hero, categories, featured products and featured shops.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::fragment::{Layout, RefetchQuery, SkeletonTemplate, resolve};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity};
use crate::state::AppState;
use crate::views::{
    self, CategoryView, FEATURED_PRODUCTS, FEATURED_SHOPS, ProductCardView, ShopView,
};

const CATEGORIES_SRC: &str = "/fragments/categories";
const FEATURED_PRODUCTS_SRC: &str = "/fragments/products/featured";
const FEATURED_SHOPS_SRC: &str = "/fragments/shops/featured";

/// Home page shell.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub categories: SkeletonTemplate,
    pub products: SkeletonTemplate,
    pub shops: SkeletonTemplate,
}

#[derive(Template, WebTemplate)]
#[template(path = "fragments/categories.html")]
pub struct CategoriesTemplate {
    pub categories: Vec<CategoryView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "fragments/featured_products.html")]
pub struct FeaturedProductsTemplate {
    pub products: Vec<ProductCardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "fragments/featured_shops.html")]
pub struct FeaturedShopsTemplate {
    pub shops: Vec<ShopView>,
}

/// Display the home page shell.
#[instrument(skip_all)]
pub async fn home(
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> impl IntoResponse {
    HomeTemplate {
        layout: Layout::new(nonce, identity.as_ref()),
        categories: SkeletonTemplate::load(CATEGORIES_SRC, 4),
        products: SkeletonTemplate::load(FEATURED_PRODUCTS_SRC, FEATURED_PRODUCTS),
        shops: SkeletonTemplate::load(FEATURED_SHOPS_SRC, FEATURED_SHOPS),
    }
}

/// Categories grid (HTMX).
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
) -> Response {
    let read = state.queries().categories(query.refetch).await;
    let categories = match resolve(read, CATEGORIES_SRC, "Failed to load categories", 4) {
        Ok(categories) => categories,
        Err(response) => return response,
    };

    CategoriesTemplate {
        categories: categories.iter().map(CategoryView::from).collect(),
    }
    .into_response()
}

/// First products of the catalog (HTMX).
#[instrument(skip(state))]
pub async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
) -> Response {
    let read = state.queries().products(query.refetch).await;
    let products = match resolve(
        read,
        FEATURED_PRODUCTS_SRC,
        "Failed to load products",
        FEATURED_PRODUCTS,
    ) {
        Ok(products) => products,
        Err(response) => return response,
    };

    let featured: Vec<_> = products.iter().take(FEATURED_PRODUCTS).collect();
    FeaturedProductsTemplate {
        products: views::cards(&featured),
    }
    .into_response()
}

/// First shops of the marketplace (HTMX).
///
/// The section stays hidden when the shop list cannot be shown.
#[instrument(skip(state))]
pub async fn featured_shops(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
) -> Response {
    let read = state.queries().shops(query.refetch).await;
    let shops = match resolve(read, FEATURED_SHOPS_SRC, "Failed to load shops", FEATURED_SHOPS) {
        Ok(shops) => shops,
        Err(response) => return response,
    };

    FeaturedShopsTemplate {
        shops: shops.iter().take(FEATURED_SHOPS).map(ShopView::from).collect(),
    }
    .into_response()
}
