//! Product search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::fragment::{Layout, SkeletonTemplate, resolve};
use crate::filters;
use crate::middleware::{CspNonce, OptionalIdentity};
use crate::state::AppState;
use crate::views::{self, ProductCardView};

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub refetch: bool,
}

impl SearchQuery {
    fn text(&self) -> &str {
        self.q.trim()
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub layout: Layout,
    pub query: String,
    /// `None` until the caller has typed something.
    pub results: Option<SkeletonTemplate>,
}

/// Search results (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "fragments/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub count_label: String,
    pub products: Vec<ProductCardView>,
}

fn results_src(text: &str) -> String {
    format!("/search/results?q={}", urlencoding::encode(text))
}

/// Display the search page shell.
#[instrument(skip(identity, nonce))]
pub async fn show(
    Query(query): Query<SearchQuery>,
    OptionalIdentity(identity): OptionalIdentity,
    nonce: CspNonce,
) -> impl IntoResponse {
    let text = query.text();
    SearchTemplate {
        layout: Layout::new(nonce, identity.as_ref()),
        query: text.to_string(),
        results: (!text.is_empty()).then(|| SkeletonTemplate::load(results_src(text), 4)),
    }
}

/// Products matching the search text (HTMX).
#[instrument(skip(state))]
pub async fn results(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let text = query.text();
    if text.is_empty() {
        return SearchResultsTemplate {
            query: String::new(),
            count_label: String::new(),
            products: Vec::new(),
        }
        .into_response();
    }

    let products = match resolve(
        state.queries().search(text, query.refetch).await,
        &results_src(text),
        "Search failed",
        4,
    ) {
        Ok(products) => products,
        Err(response) => return response,
    };

    let matches: Vec<_> = products.iter().collect();
    SearchResultsTemplate {
        query: text.to_string(),
        count_label: format!("{} found", views::pluralize(matches.len(), "product", "products")),
        products: views::cards(&matches),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_src_is_encoded() {
        assert_eq!(results_src("blue mug"), "/search/results?q=blue%20mug");
        assert_eq!(results_src("a&b"), "/search/results?q=a%26b");
    }
}
