//! Building blocks shared by page shells and HTMX fragments.
//!
//! A page shell renders immediately with skeleton placeholders. Each
//! placeholder loads its fragment, which renders one of four states:
//!
//! | Read state | Fragment output |
//! |------------|-----------------|
//! | disabled   | skeleton that polls the same URL again |
//! | error      | error notice with a Retry button (`?refetch=true`) |
//! | empty      | empty-state message |
//! | success    | content |

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::backend::OperationResult;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Identity;
use crate::state::AppState;
use crate::sync::{Mutation, QueryState};

/// How long a disabled fragment waits before polling again.
pub const POLL_DELAY: &str = "2s";

/// Query string accepted by every data fragment.
#[derive(Debug, Default, Deserialize)]
pub struct RefetchQuery {
    #[serde(default)]
    pub refetch: bool,
}

/// Data every full page passes to the base layout.
#[derive(Clone)]
pub struct Layout {
    pub nonce: String,
    pub signed_in: bool,
    pub principal: String,
}

impl Layout {
    #[must_use]
    pub fn new(nonce: CspNonce, identity: Option<&Identity>) -> Self {
        Self {
            nonce: nonce.0,
            signed_in: identity.is_some(),
            principal: identity
                .map(|i| i.principal.to_string())
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// Fragment states
// =============================================================================

/// Placeholder shown while a section has no data yet.
#[derive(Template, WebTemplate)]
#[template(path = "partials/skeleton.html")]
pub struct SkeletonTemplate {
    /// Fragment URL to load; empty for a static placeholder.
    pub src: String,
    /// Delay before loading, e.g. `2s`; empty to load immediately.
    pub delay: String,
    pub blocks: usize,
}

impl SkeletonTemplate {
    /// A placeholder that loads `src` as soon as it is on the page.
    #[must_use]
    pub fn load(src: impl Into<String>, blocks: usize) -> Self {
        Self {
            src: src.into(),
            delay: String::new(),
            blocks,
        }
    }

    /// A placeholder that polls `src` after [`POLL_DELAY`].
    #[must_use]
    pub fn poll(src: impl Into<String>, blocks: usize) -> Self {
        Self {
            src: src.into(),
            delay: POLL_DELAY.to_string(),
            blocks,
        }
    }
}

/// Error notice with a Retry button.
#[derive(Template, WebTemplate)]
#[template(path = "partials/error_notice.html")]
pub struct ErrorNoticeTemplate {
    pub title: String,
    pub message: String,
    pub retry_url: String,
}

/// Missing category, product or shop.
#[derive(Template, WebTemplate)]
#[template(path = "partials/not_found.html")]
pub struct NotFoundTemplate {
    pub title: String,
    pub message: String,
}

impl NotFoundTemplate {
    /// e.g. `NotFoundTemplate::entity("Product")`
    #[must_use]
    pub fn entity(kind: &str) -> Self {
        Self {
            title: format!("{kind} Not Found"),
            message: format!(
                "The {} you're looking for doesn't exist.",
                kind.to_lowercase()
            ),
        }
    }
}

/// Full not-found page.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPageTemplate {
    pub layout: Layout,
    pub notice: NotFoundTemplate,
}

/// Render a not-found page with a 404 status.
pub fn not_found_page(layout: Layout, kind: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundPageTemplate {
            layout,
            notice: NotFoundTemplate::entity(kind),
        },
    )
        .into_response()
}

/// `src` with `refetch=true` appended.
#[must_use]
pub fn retry_url(src: &str) -> String {
    let separator = if src.contains('?') { '&' } else { '?' };
    format!("{src}{separator}refetch=true")
}

/// Unwrap a successful read, or render the fragment for its other state.
///
/// # Errors
///
/// Returns the ready-to-send skeleton or error notice.
pub fn resolve<T>(
    state: QueryState<T>,
    src: &str,
    title: &str,
    blocks: usize,
) -> Result<T, Response> {
    match state {
        QueryState::Success(value) => Ok(value),
        QueryState::Disabled => Err(SkeletonTemplate::poll(src, blocks).into_response()),
        QueryState::Error(e) => Err(ErrorNoticeTemplate {
            title: title.to_string(),
            message: AppError::from(e).public_message(),
            retry_url: retry_url(src),
        }
        .into_response()),
    }
}

/// Parse a path ID; an unparseable ID is simply an entity that does not exist.
pub fn parse_id<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

// =============================================================================
// Toasts
// =============================================================================

const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");
const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");

/// Client event the layout script turns into a toast.
pub const TOAST_EVENT: &str = "showToast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A toast plus any refresh events to fire alongside it.
#[derive(Debug, Clone)]
pub struct Toast {
    kind: ToastKind,
    message: String,
    events: Vec<&'static str>,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
            events: Vec::new(),
        }
    }

    /// Also fire `event` on the page body.
    #[must_use]
    pub fn with_event(mut self, event: &'static str) -> Self {
        self.events.push(event);
        self
    }

    /// `HX-Trigger` header value.
    #[must_use]
    pub fn trigger_value(&self) -> String {
        let mut events = serde_json::Map::new();
        events.insert(
            TOAST_EVENT.to_string(),
            json!({ "kind": self.kind.as_str(), "message": self.message }),
        );
        for event in &self.events {
            events.insert((*event).to_string(), serde_json::Value::Null);
        }
        ascii_only(&serde_json::Value::Object(events).to_string())
    }

    fn header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.trigger_value()).ok()
    }

    /// Attach the toast to a rendered body.
    pub fn with_body(self, body: impl IntoResponse) -> Response {
        let mut response = body.into_response();
        if let Some(value) = self.header() {
            response.headers_mut().insert(HX_TRIGGER, value);
        }
        response
    }

    /// A toast that leaves the page content untouched.
    pub fn alone(self) -> Response {
        let mut response = self.with_body(());
        response
            .headers_mut()
            .insert(HX_RESWAP, HeaderValue::from_static("none"));
        response
    }
}

impl From<AppError> for Toast {
    fn from(err: AppError) -> Self {
        Self::error(err.public_message())
    }
}

/// Run a mutation for `identity`.
///
/// # Errors
///
/// A failed mutation comes back as an error toast that leaves the page alone.
pub async fn mutate(
    state: &AppState,
    identity: &Identity,
    mutation: Mutation,
) -> Result<OperationResult, Response> {
    let kind = mutation.kind();
    match state.queries().mutate(identity, mutation).await {
        Ok(result) => {
            add_breadcrumb("mutation", &format!("{kind:?} succeeded"), None);
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(error = %e, ?kind, "Mutation failed");
            Err(Toast::from(AppError::from(e)).alone())
        }
    }
}

/// Reject invalid form input with an error toast.
pub fn invalid_input(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Toast::error(message).alone()).into_response()
}

/// Escape non-ASCII characters so the JSON is a valid header value.
fn ascii_only(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::BackendError;
    use crate::sync::{MutationError, QueryError};

    #[test]
    fn test_retry_url() {
        assert_eq!(retry_url("/fragments/categories"), "/fragments/categories?refetch=true");
        assert_eq!(
            retry_url("/search/results?q=mug"),
            "/search/results?q=mug&refetch=true"
        );
    }

    #[test]
    fn test_not_found_wording() {
        let notice = NotFoundTemplate::entity("Category");
        assert_eq!(notice.title, "Category Not Found");
        assert_eq!(notice.message, "The category you're looking for doesn't exist.");
    }

    #[test]
    fn test_toast_trigger_value() {
        let toast = Toast::success("Added to wishlist").with_event("wishlist-changed");
        let value: serde_json::Value = serde_json::from_str(&toast.trigger_value()).unwrap();
        assert_eq!(value[TOAST_EVENT]["kind"], "success");
        assert_eq!(value[TOAST_EVENT]["message"], "Added to wishlist");
        assert!(value["wishlist-changed"].is_null());
    }

    #[test]
    fn test_toast_header_is_ascii() {
        let toast = Toast::error("Caf\u{e9} closed \u{1f3fa}");
        let raw = toast.trigger_value();
        assert!(raw.is_ascii());
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[TOAST_EVENT]["message"], "Caf\u{e9} closed \u{1f3fa}");
        assert!(toast.header().is_some());
    }

    #[test]
    fn test_resolve_states() {
        assert_eq!(resolve(QueryState::Success(3), "/x", "t", 1).unwrap(), 3);

        let disabled = resolve(QueryState::<u8>::Disabled, "/x", "t", 1).unwrap_err();
        assert_eq!(disabled.status(), StatusCode::OK);

        let error = QueryError::Backend(Arc::new(BackendError::Unavailable("down".to_string())));
        let failed = resolve(QueryState::<u8>::Error(error), "/x", "t", 1).unwrap_err();
        assert_eq!(failed.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_notice_hides_transport_details() {
        let error = QueryError::Backend(Arc::new(BackendError::Unavailable(
            "http://10.0.0.3:4943/status refused".to_string(),
        )));
        let notice = ErrorNoticeTemplate {
            title: "Failed to load products".to_string(),
            message: AppError::from(error).public_message(),
            retry_url: retry_url("/x"),
        };
        let html = notice.render().unwrap();
        assert!(html.contains(crate::error::SERVICE_ERROR_MESSAGE));
        assert!(!html.contains("10.0.0.3"));
    }

    #[test]
    fn test_mutation_toast_message() {
        let toast = Toast::from(AppError::from(MutationError::Failed(
            "You already reviewed this product".to_string(),
        )));
        let value: serde_json::Value = serde_json::from_str(&toast.trigger_value()).unwrap();
        assert_eq!(value[TOAST_EVENT]["kind"], "error");
        assert_eq!(value[TOAST_EVENT]["message"], "You already reviewed this product");
    }
}
