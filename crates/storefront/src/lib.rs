//! Handmade Market Storefront library.
//!
//! Server-rendered storefront for a marketplace of handmade goods, in three
//! layers:
//!
//! - [`backend`] - remote access to the marketplace backend RPC interface
//! - [`sync`] - cached, deduplicated reads and invalidating mutations
//! - [`routes`] + [`views`] - HTMX page shells and fragments
//!
//! The router is exposed through [`app`] so integration tests can serve it
//! in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod sync;
pub mod views;

use std::any::Any;

use askama::Template;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::middleware::{
    CspNonce, OptionalIdentity, create_session_layer, csp_nonce_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::routes::fragment::{Layout, not_found_page};
use crate::state::AppState;

/// Fallback page for a request whose handler panicked.
#[derive(Template)]
#[template(path = "error.html")]
struct PanicPageTemplate {}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "Request handler panicked");

    let body = PanicPageTemplate {}
        .render()
        .unwrap_or_else(|_| "Something went wrong".to_string());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn fallback(OptionalIdentity(identity): OptionalIdentity, nonce: CspNonce) -> Response {
    not_found_page(Layout::new(nonce, identity.as_ref()), "Page")
}

/// Build the storefront router with the full middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// rate limiters key on the peer address when no proxy header is present.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes::routes(state.config())
        .fallback(fallback)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(csp_nonce_middleware))
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
        .layer(CatchPanicLayer::custom(panic_response))
}
