//! Unified error handling with Sentry integration.
//!
//! Data fragments and mutation toasts show [`AppError::public_message`];
//! the login flow returns `AppError` directly as a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::sync::{MutationError, QueryError};

/// Shown in place of transport failures, which can carry internal addresses.
pub const SERVICE_ERROR_MESSAGE: &str = "Marketplace service error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cached read failed.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Mutation failed or was rejected.
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Query(_) => StatusCode::BAD_GATEWAY,
            Self::Mutation(err) => match err {
                MutationError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
                MutationError::Failed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                MutationError::Transport(_) => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the client.
    ///
    /// Backend rejections and operation failures carry the backend's
    /// user-facing message; transport failures are replaced.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Session(_) => "Internal server error".to_string(),
            Self::Query(QueryError::Backend(err)) => backend_message(err),
            Self::Query(QueryError::Mismatch(_)) => SERVICE_ERROR_MESSAGE.to_string(),
            Self::Mutation(MutationError::Transport(err)) => backend_message(err),
            Self::Mutation(err) => err.to_string(),
            Self::BadRequest(_) => self.to_string(),
        }
    }
}

fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::Rejected { message, .. } => message.clone(),
        BackendError::Http(_) | BackendError::Parse(_) | BackendError::Unavailable(_) => {
            SERVICE_ERROR_MESSAGE.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, self.public_message()).into_response()
    }
}

/// Set the Sentry user context from the caller's principal.
///
/// Call this after login to associate errors with the caller.
pub fn set_sentry_user(principal: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(principal.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a caller action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("mutation", "Added to wishlist", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sync::QueryKind;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    fn rejected(message: &str) -> BackendError {
        BackendError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("Missing principal".to_string());
        assert_eq!(err.to_string(), "Bad request: Missing principal");
        assert_eq!(err.public_message(), "Bad request: Missing principal");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Query(QueryError::Mismatch(QueryKind::Shops))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Mutation(MutationError::Disabled)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Mutation(MutationError::Failed("x".to_string()))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_transport_details_hidden() {
        let err = AppError::from(QueryError::Backend(Arc::new(BackendError::Unavailable(
            "http://10.0.0.3:4943 refused".to_string(),
        ))));
        assert_eq!(err.public_message(), SERVICE_ERROR_MESSAGE);

        let err = AppError::from(MutationError::Transport(BackendError::Unavailable(
            "http://10.0.0.3:4943 refused".to_string(),
        )));
        assert_eq!(err.public_message(), SERVICE_ERROR_MESSAGE);
    }

    #[test]
    fn test_backend_messages_shown() {
        let err = AppError::from(QueryError::Backend(Arc::new(rejected("Shop is closed"))));
        assert_eq!(err.public_message(), "Shop is closed");

        let err = AppError::from(MutationError::Transport(rejected(
            "Unauthorized: Only users can add reviews",
        )));
        assert_eq!(err.public_message(), "Unauthorized: Only users can add reviews");

        let err = AppError::from(MutationError::Failed("Already reviewed".to_string()));
        assert_eq!(err.public_message(), "Already reviewed");

        let err = AppError::from(MutationError::Disabled);
        assert_eq!(
            err.public_message(),
            "The marketplace is not available yet. Please try again shortly."
        );
    }
}
