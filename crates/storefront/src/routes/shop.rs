//! Shop page, favourites and custom order requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use handmade_market_core::ShopId;
use serde::Deserialize;
use tracing::instrument;

use super::fragment::{
    Layout, NotFoundTemplate, RefetchQuery, SkeletonTemplate, Toast, invalid_input, mutate,
    not_found_page, parse_id, resolve,
};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity, RequireIdentity};
use crate::models::Identity;
use crate::state::AppState;
use crate::sync::{Mutation, QueryState};
use crate::views::{self, ProductCardView, ShopView};

/// Fired after a custom order request is created.
pub const CUSTOM_ORDERS_CHANGED: &str = "custom-orders-changed";

/// Shop page shell.
#[derive(Template, WebTemplate)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub layout: Layout,
    pub name: String,
    pub contents: SkeletonTemplate,
}

/// Shop header, announcements and products (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/shop_contents.html")]
pub struct ShopContentsTemplate {
    pub shop: ShopView,
    pub shop_id: ShopId,
    pub signed_in: bool,
    pub favorite: bool,
    pub products: Vec<ProductCardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_button.html")]
pub struct FavoriteButtonTemplate {
    pub shop_id: ShopId,
    pub favorite: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/custom_order_form.html")]
pub struct CustomOrderFormTemplate {
    pub shop_id: ShopId,
}

fn contents_src(id: ShopId) -> String {
    format!("/shop/{id}/contents")
}

/// Display the shop page shell.
#[instrument(skip(state, identity, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> Response {
    let layout = Layout::new(nonce, identity.as_ref());
    let Some(id) = parse_id::<ShopId>(&raw_id) else {
        return not_found_page(layout, "Shop");
    };

    let name = match state.queries().shops(false).await {
        QueryState::Success(shops) => match views::find_shop(&shops, id) {
            Some(shop) => shop.name.clone(),
            None => return not_found_page(layout, "Shop"),
        },
        QueryState::Disabled | QueryState::Error(_) => "Shop".to_string(),
    };

    ShopTemplate {
        layout,
        name,
        contents: SkeletonTemplate::load(contents_src(id), 6),
    }
    .into_response()
}

/// Shop contents (HTMX).
#[instrument(skip(state, identity))]
pub async fn contents(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    let Some(id) = parse_id::<ShopId>(&raw_id) else {
        return NotFoundTemplate::entity("Shop").into_response();
    };

    let queries = state.queries();
    let (shops, products, favorites) = tokio::join!(
        queries.shops(query.refetch),
        queries.products(query.refetch),
        queries.favorites(identity.as_ref(), query.refetch)
    );
    let (shops, products) = match resolve(
        shops.zip(products),
        &contents_src(id),
        "Failed to load shop",
        6,
    ) {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let Some(shop) = views::find_shop(&shops, id) else {
        return NotFoundTemplate::entity("Shop").into_response();
    };

    ShopContentsTemplate {
        shop: ShopView::from(shop),
        shop_id: id,
        signed_in: identity.is_some(),
        favorite: favorites.success().is_some_and(|ids| ids.contains(&id)),
        products: views::cards(&views::products_in_shop(&products, id)),
    }
    .into_response()
}

/// Add a shop to the caller's favourites.
#[instrument(skip(state, identity), fields(caller = %identity.principal))]
pub async fn favorite(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    RequireIdentity(identity): RequireIdentity,
) -> Response {
    set_favorite(&state, &raw_id, &identity, true).await
}

/// Remove a shop from the caller's favourites.
#[instrument(skip(state, identity), fields(caller = %identity.principal))]
pub async fn unfavorite(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    RequireIdentity(identity): RequireIdentity,
) -> Response {
    set_favorite(&state, &raw_id, &identity, false).await
}

async fn set_favorite(
    state: &AppState,
    raw_id: &str,
    identity: &Identity,
    favorite: bool,
) -> Response {
    let Some(id) = parse_id::<ShopId>(raw_id) else {
        return Toast::error("Shop not found").alone();
    };

    let (mutation, message) = if favorite {
        (Mutation::AddToFavorites(id), "Added to favourites")
    } else {
        (Mutation::RemoveFromFavorites(id), "Removed from favourites")
    };
    if let Err(response) = mutate(state, identity, mutation).await {
        return response;
    }

    // The swapped button is the only view of favourite state
    Toast::success(message).with_body(FavoriteButtonTemplate {
        shop_id: id,
        favorite,
    })
}

#[derive(Debug, Deserialize)]
pub struct CustomOrderForm {
    #[serde(default)]
    pub description: String,
}

/// Submit a custom order request and hand back a fresh form.
#[instrument(skip(state, identity, form), fields(caller = %identity.principal))]
pub async fn custom_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<CustomOrderForm>,
) -> Response {
    let Some(id) = parse_id::<ShopId>(&raw_id) else {
        return Toast::error("Shop not found").alone();
    };

    let description = form.description.trim();
    if description.is_empty() {
        return invalid_input("Please describe your custom order request");
    }

    let mutation = Mutation::CreateCustomOrder {
        shop_id: id,
        description: description.to_string(),
    };
    if let Err(response) = mutate(&state, &identity, mutation).await {
        return response;
    }

    Toast::success("Custom order request submitted!")
        .with_event(CUSTOM_ORDERS_CHANGED)
        .with_body(CustomOrderFormTemplate { shop_id: id })
}
