//! Health checks.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness: the server is running. Does not check the backend.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: 503 until the backend connection is established.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
