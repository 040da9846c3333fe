//! Caller's custom order requests.

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
use crate::views::{CustomOrderView, pluralize};

const ITEMS_SRC: &str = "/custom-orders/items";

#[derive(Template, WebTemplate)]
#[template(path = "custom_orders.html")]
pub struct CustomOrdersTemplate {
    pub layout: Layout,
    pub items: Option<SkeletonTemplate>,
}

#[derive(Template, WebTemplate)]
#[template(path = "fragments/custom_orders_items.html")]
pub struct CustomOrdersItemsTemplate {
    pub signed_in: bool,
    pub count_label: String,
    pub orders: Vec<CustomOrderView>,
}

/// Display the custom orders page shell.
#[instrument(skip(identity, nonce))]
pub async fn show(
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> impl IntoResponse {
    CustomOrdersTemplate {
        items: identity
            .as_ref()
            .map(|_| SkeletonTemplate::load(ITEMS_SRC, 3)),
        layout: Layout::new(nonce, identity.as_ref()),
    }
}

/// The caller's requests, newest first (HTMX).
///
/// Shop names come from the shop list when it is available.
#[instrument(skip(state, identity))]
pub async fn items(
    State(state): State<AppState>,
    Query(query): Query<RefetchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Response {
    if identity.is_none() {
        return CustomOrdersItemsTemplate {
            signed_in: false,
            count_label: String::new(),
            orders: Vec::new(),
        }
        .into_response();
    }

    let queries = state.queries();
    let (orders, shops) = tokio::join!(
        queries.custom_orders(identity.as_ref(), query.refetch),
        queries.shops(query.refetch)
    );
    let orders = match resolve(orders, ITEMS_SRC, "Failed to load custom orders", 3) {
        Ok(orders) => orders,
        Err(response) => return response,
    };
    let shops = shops.success().unwrap_or_default();

    let mut sorted: Vec<_> = orders.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    CustomOrdersItemsTemplate {
        signed_in: true,
        count_label: pluralize(sorted.len(), "request", "requests"),
        orders: sorted
            .into_iter()
            .map(|order| CustomOrderView::new(order, &shops))
            .collect(),
    }
    .into_response()
}
