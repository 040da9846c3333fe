//! Login, caller-scoped reads and mutations.

#![allow(clippy::unwrap_used)]

use handmade_market_integration_tests::{Marketplace, TestApp, hx_trigger, review};
use reqwest::StatusCode;

#[tokio::test]
async fn test_anonymous_mutation_redirects_to_login() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let response = app.post_form("/wishlist/add", &[("product_id", "1")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Redirect").unwrap(), "/auth/login");

    let response = app
        .client
        .post(app.url("/shop/1/favorite"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(reqwest::header::LOCATION).unwrap(),
        "/auth/login"
    );

    assert_eq!(app.backend.calls("addToWishlist"), 0);
    assert_eq!(app.backend.calls("addToFavorites"), 0);
}

#[tokio::test]
async fn test_login_rejects_mismatched_state() {
    let app = TestApp::spawn(Marketplace::sample()).await;

    let _ = app.get("/auth/login").await;
    let response = app
        .get("/auth/callback?state=forged&principal=alice&delegation=delegation-alice")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains(r#"href="/auth/login""#));
}

#[tokio::test]
async fn test_anonymous_caller_reads_are_empty() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    let queries = app.state.queries();

    let profile = queries.current_user_profile(None, false).await;
    assert!(matches!(profile.success(), Some(None)));

    let wishlist = queries.wishlist(None, false).await.success().unwrap();
    assert!(wishlist.is_empty());

    let page = app.get("/wishlist").await.text().await.unwrap();
    assert!(page.contains(
        "Please login to view and manage your wishlist of favorite handmade items."
    ));
}

#[tokio::test]
async fn test_wishlist_add_then_remove_restores_membership() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("alice").await;

    let details = app.fragment_text("/product/1/details").await;
    assert!(details.contains("Add to Wishlist"));

    let response = app.post_form("/wishlist/add", &[("product_id", "1")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let trigger = hx_trigger(&response).unwrap();
    assert_eq!(trigger["showToast"]["kind"], "success");
    assert_eq!(trigger["showToast"]["message"], "Added to wishlist");
    assert!(trigger.get("wishlist-changed").is_some());
    assert!(response.text().await.unwrap().contains("In Wishlist"));

    let items = app.fragment_text("/wishlist/items").await;
    assert!(items.contains("Speckled Mug"));
    assert!(items.contains("1 item saved"));

    let details = app.fragment_text("/product/1/details").await;
    assert!(details.contains("In Wishlist"));

    let response = app.post_form("/wishlist/remove", &[("product_id", "1")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        hx_trigger(&response).unwrap()["showToast"]["message"],
        "Removed from wishlist"
    );

    let items = app.fragment_text("/wishlist/items").await;
    assert!(items.contains("Your wishlist is empty."));
    assert!(app.backend.with_market(|m| m.wishlists["alice"].is_empty()));
}

#[tokio::test]
async fn test_review_updates_average_and_only_that_product() {
    let market = Marketplace {
        reviews: vec![review(1, 1, 4, "Lovely glaze"), review(2, 2, 3, "Itchy")],
        ..Marketplace::sample()
    };
    let app = TestApp::spawn(market).await;
    app.login("bob").await;

    let before = app.fragment_text("/product/1/reviews").await;
    assert!(before.contains("4.0 out of 5 (1 review)"));
    assert!(before.contains("Submit Review"));
    let _ = app.fragment_text("/product/2/reviews").await;
    assert_eq!(app.backend.calls("getReviewsForProduct"), 2);

    let response = app
        .post_form(
            "/product/1/reviews",
            &[("rating", "5"), ("comment", "Even better in person")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        hx_trigger(&response).unwrap()["showToast"]["message"],
        "Review submitted successfully!"
    );
    let after = response.text().await.unwrap();
    assert!(after.contains("4.5 out of 5 (2 reviews)"));
    assert!(after.contains("Even better in person"));
    assert_eq!(app.backend.calls("getReviewsForProduct"), 3);

    // Product 2's reviews are still cached
    let other = app.fragment_text("/product/2/reviews").await;
    assert!(other.contains("3.0 out of 5 (1 review)"));
    assert_eq!(app.backend.calls("getReviewsForProduct"), 3);
}

#[tokio::test]
async fn test_review_form_validation() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("bob").await;

    let response = app
        .post_form("/product/1/reviews", &[("rating", "5"), ("comment", "   ")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        hx_trigger(&response).unwrap()["showToast"]["message"],
        "Please write a comment"
    );

    for rating in ["0", "6", "five"] {
        let response = app
            .post_form("/product/1/reviews", &[("rating", rating), ("comment", "Nice")])
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "rating {rating}");
        assert_eq!(hx_trigger(&response).unwrap()["showToast"]["kind"], "error");
    }

    assert_eq!(app.backend.calls("addReview"), 0);
}

#[tokio::test]
async fn test_failed_mutation_shows_error_toast() {
    let market = Marketplace {
        mutation_failure: Some("Product is already in your wishlist".to_string()),
        ..Marketplace::sample()
    };
    let app = TestApp::spawn(market).await;
    app.login("alice").await;

    let response = app.post_form("/wishlist/add", &[("product_id", "1")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Reswap").unwrap(), "none");
    let trigger = hx_trigger(&response).unwrap();
    assert_eq!(trigger["showToast"]["kind"], "error");
    assert_eq!(
        trigger["showToast"]["message"],
        "Product is already in your wishlist"
    );
    assert!(trigger.get("wishlist-changed").is_none());
}

#[tokio::test]
async fn test_custom_order_request() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("carol").await;

    let response = app
        .post_form("/shop/1/custom-order", &[("description", "  ")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        hx_trigger(&response).unwrap()["showToast"]["message"],
        "Please describe your custom order request"
    );

    let response = app
        .post_form("/shop/1/custom-order", &[("description", "A teal vase")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let trigger = hx_trigger(&response).unwrap();
    assert_eq!(trigger["showToast"]["message"], "Custom order request submitted!");
    assert!(trigger.get("custom-orders-changed").is_some());

    let orders = app.fragment_text("/custom-orders/items").await;
    assert!(orders.contains("A teal vase"));
    assert!(orders.contains("Clay Corner"));
    assert!(orders.contains("Pending"));
}

#[tokio::test]
async fn test_favorite_shop() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("dave").await;

    let contents = app.fragment_text("/shop/1/contents").await;
    assert!(contents.contains("/shop/1/favorite"));

    let response = app.post_form("/shop/1/favorite", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let trigger = hx_trigger(&response).unwrap();
    assert_eq!(trigger["showToast"]["message"], "Added to favourites");
    assert_eq!(trigger.as_object().unwrap().len(), 1);
    assert!(response.text().await.unwrap().contains("/shop/1/unfavorite"));

    let contents = app.fragment_text("/shop/1/contents").await;
    assert!(contents.contains("/shop/1/unfavorite"));
}

#[tokio::test]
async fn test_profile_setup_for_new_caller() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("erin").await;

    let setup = app.fragment_text("/fragments/profile-setup").await;
    assert!(setup.contains("Set up your profile"));

    let response = app.post_form("/profile", &[("name", ""), ("bio", ""), ("email", "")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_form("/profile", &[("name", "Erin"), ("bio", "Knitter"), ("email", "")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&response).unwrap()["showToast"]["message"], "Profile saved!");

    let setup = app.fragment_text("/fragments/profile-setup").await;
    assert!(!setup.contains("Set up your profile"));
    assert_eq!(
        app.backend.with_market(|m| m.profiles["erin"].name.clone()),
        "Erin"
    );
}

#[tokio::test]
async fn test_logout_clears_caller_cache() {
    let app = TestApp::spawn(Marketplace::sample()).await;
    app.login("frank").await;

    let _ = app.fragment_text("/wishlist/items").await;
    let _ = app.fragment_text("/wishlist/items").await;
    assert_eq!(app.backend.calls("getMyWishlist"), 1);

    let response = app.client.post(app.url("/auth/logout")).send().await.unwrap();
    assert!(response.status().is_redirection());

    let items = app.fragment_text("/wishlist/items").await;
    assert!(items.contains("Please login"));

    app.login("frank").await;
    let _ = app.fragment_text("/wishlist/items").await;
    assert_eq!(app.backend.calls("getMyWishlist"), 2);
}
