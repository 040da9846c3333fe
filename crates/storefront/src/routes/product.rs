//! Product page: details, the caller's wishlist state and reviews.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use handmade_market_core::{ProductId, Rating};
use serde::Deserialize;
use tracing::instrument;

use super::fragment::{
    Layout, NotFoundTemplate, RefetchQuery, SkeletonTemplate, Toast, invalid_input, mutate,
    not_found_page, parse_id, resolve,
};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity, RequireIdentity};
use crate::state::AppState;
use crate::sync::{Mutation, QueryState};
use crate::views::{self, ProductDetailView, ReviewSummary, ReviewView, ShopView};

/// Product page shell.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub name: String,
    pub details: SkeletonTemplate,
    pub reviews: SkeletonTemplate,
}

/// Product details (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/product_details.html")]
pub struct ProductDetailsTemplate {
    pub product: ProductDetailView,
    pub shop: Option<ShopView>,
    pub signed_in: bool,
    pub in_wishlist: bool,
    pub product_id: ProductId,
    pub shop_id: handmade_market_core::ShopId,
}

/// Review list and form (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/reviews.html")]
pub struct ReviewsTemplate {
    pub product_id: ProductId,
    pub summary: Option<ReviewSummary>,
    pub reviews: Vec<ReviewView>,
    pub signed_in: bool,
}

fn details_src(id: ProductId) -> String {
    format!("/product/{id}/details")
}

fn reviews_src(id: ProductId) -> String {
    format!("/product/{id}/reviews")
}

/// Display the product page shell.
#[instrument(skip(state, identity, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> Response {
    let layout = Layout::new(nonce, identity.as_ref());
    let Some(id) = parse_id::<ProductId>(&raw_id) else {
        return not_found_page(layout, "Product");
    };

    let name = match state.queries().products(false).await {
        QueryState::Success(products) => match views::find_product(&products, id) {
            Some(product) => product.name.clone(),
            None => return not_found_page(layout, "Product"),
        },
        QueryState::Disabled | QueryState::Error(_) => "Product".to_string(),
    };

    ProductTemplate {
        layout,
        name,
        details: SkeletonTemplate::load(details_src(id), 2),
        reviews: SkeletonTemplate::load(reviews_src(id), 3),
    }
    .into_response()
}

/// Product details with the shop link and wishlist button (HTMX).
///
/// Only the product list is required; a missing shop or wishlist degrades
/// to no shop link and an unchecked wishlist button.
#[instrument(skip(state, identity))]
pub async fn details(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    let Some(id) = parse_id::<ProductId>(&raw_id) else {
        return NotFoundTemplate::entity("Product").into_response();
    };

    let queries = state.queries();
    let (products, shops, wishlist) = tokio::join!(
        queries.products(query.refetch),
        queries.shops(query.refetch),
        queries.wishlist(identity.as_ref(), query.refetch)
    );
    let products = match resolve(products, &details_src(id), "Failed to load product", 2) {
        Ok(products) => products,
        Err(response) => return response,
    };

    let Some(product) = views::find_product(&products, id) else {
        return NotFoundTemplate::entity("Product").into_response();
    };

    let shop = shops
        .success()
        .and_then(|shops| views::find_shop(&shops, product.shop_id).map(ShopView::from));
    let in_wishlist = wishlist
        .success()
        .is_some_and(|ids| ids.contains(&product.id));

    ProductDetailsTemplate {
        product: ProductDetailView::from(product),
        shop,
        signed_in: identity.is_some(),
        in_wishlist,
        product_id: product.id,
        shop_id: product.shop_id,
    }
    .into_response()
}

/// Reviews for a product (HTMX).
#[instrument(skip(state, identity))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    let Some(id) = parse_id::<ProductId>(&raw_id) else {
        return NotFoundTemplate::entity("Product").into_response();
    };
    render_reviews(&state, id, query.refetch, identity.is_some()).await
}

async fn render_reviews(
    state: &AppState,
    id: ProductId,
    refetch: bool,
    signed_in: bool,
) -> Response {
    let reviews = match resolve(
        state.queries().reviews(id, refetch).await,
        &reviews_src(id),
        "Failed to load reviews",
        3,
    ) {
        Ok(reviews) => reviews,
        Err(response) => return response,
    };

    ReviewsTemplate {
        product_id: id,
        summary: views::review_summary(&reviews),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        signed_in,
    }
    .into_response()
}

/// Review form submission.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

/// Submit a review, then re-render the reviews with the new one included.
#[instrument(skip(state, identity, form), fields(caller = %identity.principal))]
pub async fn add_review(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<ReviewForm>,
) -> Response {
    let Some(id) = parse_id::<ProductId>(&raw_id) else {
        return NotFoundTemplate::entity("Product").into_response();
    };

    let comment = form.comment.trim();
    if comment.is_empty() {
        return invalid_input("Please write a comment");
    }
    let Some(rating) = form
        .rating
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|value| Rating::new(value).ok())
    else {
        return invalid_input("Please choose a rating from 1 to 5 stars");
    };

    let mutation = Mutation::AddReview {
        product_id: id,
        rating,
        comment: comment.to_string(),
        photos: Vec::new(),
    };
    if let Err(response) = mutate(&state, &identity, mutation).await {
        return response;
    }

    Toast::success("Review submitted successfully!")
        .with_body(render_reviews(&state, id, false, true).await)
}
