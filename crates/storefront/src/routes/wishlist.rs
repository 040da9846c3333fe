//! Caller's wishlist.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use handmade_market_core::ProductId;
use serde::Deserialize;
use tracing::instrument;

use super::fragment::{Layout, RefetchQuery, SkeletonTemplate, Toast, mutate, parse_id, resolve};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity, RequireIdentity};
use crate::state::AppState;
use crate::sync::Mutation;
use crate::views::{self, ProductCardView};

/// Fired after an item is added to or removed from the wishlist.
pub const WISHLIST_CHANGED: &str = "wishlist-changed";

const ITEMS_SRC: &str = "/wishlist/items";

#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    /// `None` for anonymous callers, who get a login prompt instead.
    pub items: Option<SkeletonTemplate>,
}

/// Saved products (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/wishlist_items.html")]
pub struct WishlistItemsTemplate {
    pub signed_in: bool,
    pub count_label: String,
    pub products: Vec<ProductCardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: ProductId,
    pub in_wishlist: bool,
}

/// Display the wishlist page shell.
#[instrument(skip(identity, nonce))]
pub async fn show(
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> impl IntoResponse {
    let items = identity
        .as_ref()
        .map(|_| SkeletonTemplate::load(ITEMS_SRC, 4));
    WishlistTemplate {
        layout: Layout::new(nonce, identity.as_ref()),
        items,
    }
}

/// Wishlist items in catalog order (HTMX).
#[instrument(skip(state, identity))]
pub async fn items(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    if identity.is_none() {
        return WishlistItemsTemplate {
            signed_in: false,
            count_label: String::new(),
            products: Vec::new(),
        }
        .into_response();
    }

    let queries = state.queries();
    let (wishlist, products) = tokio::join!(
        queries.wishlist(identity.as_ref(), query.refetch),
        queries.products(query.refetch)
    );
    let (wishlist, products) = match resolve(
        wishlist.zip(products),
        ITEMS_SRC,
        "Failed to load wishlist",
        4,
    ) {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let saved = views::products_in_wishlist(&products, &wishlist);
    WishlistItemsTemplate {
        signed_in: true,
        count_label: format!("{} saved", views::pluralize(saved.len(), "item", "items")),
        products: views::cards(&saved),
    }
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    #[serde(default)]
    pub product_id: String,
}

/// Add a product to the wishlist.
#[instrument(skip(state, identity, form), fields(caller = %identity.principal))]
pub async fn add(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<WishlistForm>,
) -> Response {
    let Some(id) = parse_id::<ProductId>(form.product_id.trim()) else {
        return Toast::error("Product not found").alone();
    };
    if let Err(response) = mutate(&state, &identity, Mutation::AddToWishlist(id)).await {
        return response;
    }

    Toast::success("Added to wishlist")
        .with_event(WISHLIST_CHANGED)
        .with_body(WishlistButtonTemplate {
            product_id: id,
            in_wishlist: true,
        })
}

/// Remove a product from the wishlist.
#[instrument(skip(state, identity, form), fields(caller = %identity.principal))]
pub async fn remove(
    State(state): State<AppState>,
    RequireIdentity(identity): RequireIdentity,
    Form(form): Form<WishlistForm>,
) -> Response {
    let Some(id) = parse_id::<ProductId>(form.product_id.trim()) else {
        return Toast::error("Product not found").alone();
    };
    if let Err(response) = mutate(&state, &identity, Mutation::RemoveFromWishlist(id)).await {
        return response;
    }

    Toast::success("Removed from wishlist")
        .with_event(WISHLIST_CHANGED)
        .with_body(WishlistButtonTemplate {
            product_id: id,
            in_wishlist: false,
        })
}
