//! Category page: products carrying the category's name as a tag.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use handmade_market_core::CategoryId;
use tracing::instrument;

use super::fragment::{
    Layout, NotFoundTemplate, RefetchQuery, SkeletonTemplate, not_found_page, parse_id, resolve,
};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity};
use crate::state::AppState;
use crate::sync::QueryState;
use crate::views::{self, ProductCardView};

/// Category page shell.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub layout: Layout,
    pub name: String,
    pub products: SkeletonTemplate,
}

/// Products in a category (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/category_products.html")]
pub struct CategoryProductsTemplate {
    pub count_label: String,
    pub products: Vec<ProductCardView>,
}

fn products_src(id: CategoryId) -> String {
    format!("/category/{id}/products")
}

/// Display the category page shell.
///
/// Renders 404 when the category list is known and lacks the ID. While the
/// list is unavailable the shell renders and the fragment decides.
#[instrument(skip(state, identity, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> Response {
    let layout = Layout::new(nonce, identity.as_ref());
    let Some(id) = parse_id::<CategoryId>(&raw_id) else {
        return not_found_page(layout, "Category");
    };

    let name = match state.queries().categories(false).await {
        QueryState::Success(categories) => match views::find_category(&categories, id) {
            Some(category) => category.name.clone(),
            None => return not_found_page(layout, "Category"),
        },
        QueryState::Disabled | QueryState::Error(_) => "Category".to_string(),
    };

    CategoryTemplate {
        layout,
        name,
        products: SkeletonTemplate::load(products_src(id), 8),
    }
    .into_response()
}

/// Products tagged with the category's name (HTMX).
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<RefetchQuery>,
) -> Response {
    let Some(id) = parse_id::<CategoryId>(&raw_id) else {
        return NotFoundTemplate::entity("Category").into_response();
    };

    let queries = state.queries();
    let (categories, products) = tokio::join!(
        queries.categories(query.refetch),
        queries.products(query.refetch)
    );
    let (categories, products) = match resolve(
        categories.zip(products),
        &products_src(id),
        "Failed to load products",
        8,
    ) {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let Some(category) = views::find_category(&categories, id) else {
        return NotFoundTemplate::entity("Category").into_response();
    };

    let matching = views::products_in_category(&products, category);
    CategoryProductsTemplate {
        count_label: format!("{} available", views::pluralize(matching.len(), "item", "items")),
        products: views::cards(&matching),
    }
    .into_response()
}
