//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! Page shells render immediately; each section loads from a fragment route.
//!
//! ```text
//! GET  /                            - Home page shell
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Backend readiness check
//!
//! # Layout fragments (HTMX)
//! GET  /fragments/categories        - Category grid
//! GET  /fragments/products/featured - First products in the catalog
//! GET  /fragments/shops/featured    - First shops
//! GET  /fragments/profile-setup     - Profile setup form for new callers
//!
//! # Catalog
//! GET  /category/{id}               - Category shell
//! GET  /category/{id}/products      - Products tagged with the category (HTMX)
//! GET  /product/{id}                - Product shell
//! GET  /product/{id}/details        - Product detail (HTMX)
//! GET  /product/{id}/reviews        - Reviews and average rating (HTMX)
//! GET  /shop/{id}                   - Shop shell
//! GET  /shop/{id}/contents          - Shop header, announcements, products (HTMX)
//! GET  /search?q=                   - Search shell
//! GET  /search/results?q=           - Search results (HTMX)
//!
//! # Caller data (requires auth)
//! GET  /wishlist                    - Wishlist shell (login prompt when anonymous)
//! GET  /wishlist/items              - Saved products (HTMX)
//! GET  /custom-orders               - Custom order requests shell
//! GET  /custom-orders/items         - Custom order requests (HTMX)
//!
//! # Mutations (requires auth, rate limited)
//! POST /product/{id}/reviews        - Submit a review
//! POST /shop/{id}/custom-order      - Request a custom order
//! POST /shop/{id}/favorite          - Add shop to favourites
//! POST /shop/{id}/unfavorite        - Remove shop from favourites
//! POST /wishlist/add                - Add product to wishlist
//! POST /wishlist/remove             - Remove product from wishlist
//! POST /profile                     - Save profile
//!
//! # Auth (rate limited)
//! GET  /auth/login                  - Redirect to the identity provider
//! GET  /auth/callback               - Identity provider callback
//! POST /auth/logout                 - Log out
//! ```

pub mod auth;
pub mod category;
pub mod custom_orders;
pub mod fragment;
pub mod health;
pub mod home;
pub mod product;
pub mod profile;
pub mod search;
pub mod shop;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::StorefrontConfig;
use crate::middleware::{RateLimiterLayer, auth_rate_limiter, mutation_rate_limiter};
use crate::state::AppState;

/// Apply a rate limiter when one could be built.
fn limited(router: Router<AppState>, limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    match limiter {
        Some(layer) => router.layer(layer),
        None => {
            tracing::warn!("Rate limiter configuration rejected, serving without limits");
            router
        }
    }
}

/// Create the layout fragment routes router.
pub fn fragment_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(home::categories))
        .route("/products/featured", get(home::featured_products))
        .route("/shops/featured", get(home::featured_shops))
        .route("/profile-setup", get(profile::setup))
}

/// Create the read-only page and fragment routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/category/{id}", get(category::show))
        .route("/category/{id}/products", get(category::products))
        .route("/product/{id}", get(product::show))
        .route("/product/{id}/details", get(product::details))
        .route("/product/{id}/reviews", get(product::reviews))
        .route("/shop/{id}", get(shop::show))
        .route("/shop/{id}/contents", get(shop::contents))
        .route("/search", get(search::show))
        .route("/search/results", get(search::results))
        .route("/wishlist", get(wishlist::show))
        .route("/wishlist/items", get(wishlist::items))
        .route("/custom-orders", get(custom_orders::show))
        .route("/custom-orders/items", get(custom_orders::items))
        .nest("/fragments", fragment_routes())
}

/// Create the mutation routes router.
pub fn mutation_routes() -> Router<AppState> {
    Router::new()
        .route("/product/{id}/reviews", post(product::add_review))
        .route("/shop/{id}/custom-order", post(shop::custom_order))
        .route("/shop/{id}/favorite", post(shop::favorite))
        .route("/shop/{id}/unfavorite", post(shop::unfavorite))
        .route("/wishlist/add", post(wishlist::add))
        .route("/wishlist/remove", post(wishlist::remove))
        .route("/profile", post(profile::save))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    let trust_proxy_headers = config.trust_proxy_headers;
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(limited(
            mutation_routes(),
            mutation_rate_limiter(trust_proxy_headers),
        ))
        .nest(
            "/auth",
            limited(auth_routes(), auth_rate_limiter(trust_proxy_headers)),
        )
}
