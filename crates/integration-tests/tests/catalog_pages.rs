//! Page shells and catalog fragments.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use handmade_market_integration_tests::{Marketplace, TestApp};
use reqwest::StatusCode;

#[tokio::test]
async fn test_home_shell_renders_skeletons() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-security-policy"));
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.text().await.unwrap();
    assert!(body.contains("Discover Handmade Treasures"));
    assert!(body.contains(r#"hx-get="/fragments/categories""#));
    assert!(body.contains(r#"hx-get="/fragments/products/featured""#));
    assert!(body.contains(r#"hx-get="/fragments/shops/featured""#));
}

#[tokio::test]
async fn test_ceramics_category_shows_exactly_tagged_product() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let shell = app.get("/category/1").await;
    assert_eq!(shell.status(), StatusCode::OK);
    assert!(shell.text().await.unwrap().contains("<h1>Ceramics</h1>"));

    let body = app.fragment_text("/category/1/products").await;
    assert!(body.contains("Speckled Mug"));
    // Tagged lowercase "ceramics"; matching is exact
    assert!(!body.contains("Glazed Bowl"));
    assert!(!body.contains("Wool Scarf"));
    assert!(body.contains("1 item available"));
}

#[tokio::test]
async fn test_empty_catalog_renders_empty_states() {
    let app = TestApp::spawn(Marketplace::default()).await;

    let products = app.fragment_text("/fragments/products/featured").await;
    assert!(products.contains("No products available yet."));
    assert!(!products.contains("Retry"));

    let categories = app.fragment_text("/fragments/categories").await;
    assert!(categories.contains("No categories available yet."));
}

#[tokio::test]
async fn test_unknown_entities_render_not_found() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    for (path, title) in [
        ("/category/99", "Category Not Found"),
        ("/product/99", "Product Not Found"),
        ("/shop/99", "Shop Not Found"),
        ("/product/not-a-number", "Product Not Found"),
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert!(response.text().await.unwrap().contains(title), "{path}");
    }

    let fragment = app.fragment_text("/product/99/details").await;
    assert!(fragment.contains("Product Not Found"));

    let response = app.get("/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_error_renders_retry_then_recovers() {
    let market = Marketplace {
        broken_methods: HashSet::from(["getProducts".to_string()]),
        ..Marketplace::sample()
    };
    let app = TestApp::spawn(market).await;

    let body = app.fragment_text("/fragments/products/featured").await;
    assert!(body.contains("Retry"));
    assert!(body.contains("/fragments/products/featured?refetch=true"));

    app.backend.with_market(|m| m.broken_methods.clear());

    let body = app
        .fragment_text("/fragments/products/featured?refetch=true")
        .await;
    assert!(body.contains("Speckled Mug"));
    assert!(!body.contains("Retry"));
}

#[tokio::test]
async fn test_product_and_shop_fragments() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let details = app.fragment_text("/product/1/details").await;
    assert!(details.contains("Speckled Mug"));
    assert!(details.contains("$28.00"));
    assert!(details.contains(r#"href="/shop/1""#));
    assert!(details.contains("Visit shop"));

    let shop = app.fragment_text("/shop/1/contents").await;
    assert!(shop.contains("Clay Corner"));
    assert!(shop.contains("Kiln firing every Friday"));
    assert!(shop.contains("Speckled Mug"));
    assert!(shop.contains("Glazed Bowl"));
    assert!(!shop.contains("Wool Scarf"));
}

#[tokio::test]
async fn test_reviews_fragment_shows_average() {
    let market = Marketplace {
        reviews: vec![
            handmade_market_integration_tests::review(1, 1, 5, "Perfect weight"),
            handmade_market_integration_tests::review(2, 1, 4, "Lovely glaze"),
        ],
        ..Marketplace::sample()
    };
    let app = TestApp::spawn(market).await;

    let body = app.fragment_text("/product/1/reviews").await;
    assert!(body.contains("4.5 out of 5 (2 reviews)"));
    assert!(body.contains("Lovely glaze"));
    // Anonymous callers get no review form
    assert!(!body.contains("Submit Review"));

    let empty = app.fragment_text("/product/2/reviews").await;
    assert!(empty.contains("No reviews yet. Be the first to review this product!"));
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let shell = app.get("/search?q=blue%20mug").await.text().await.unwrap();
    assert!(shell.contains("/search/results?q=blue%20mug"));

    let results = app.fragment_text("/search/results?q=mug").await;
    assert!(results.contains("Speckled Mug"));
    assert!(!results.contains("Wool Scarf"));
    assert!(results.contains("1 product found"));
}

#[tokio::test]
async fn test_health_checks() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);
    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);
}
