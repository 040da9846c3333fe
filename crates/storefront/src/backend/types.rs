//! Request and response contracts for backend calls.

use handmade_market_core::{OrderId, ReviewId};
use serde::{Deserialize, Serialize};

/// Structured result returned by backend mutations.
///
/// `success == false` with an `error` is an operation failure. The ID fields
/// are filled by the mutations that create something.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<ReviewId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl OperationResult {
    /// A successful result without payload.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A failed result with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// The failure message, when the backend reported one.
    ///
    /// `success == false` without a message is not treated as a failure.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.error.as_deref()
        }
    }
}

/// Body of a non-2xx backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_requires_message() {
        assert_eq!(OperationResult::ok().failure(), None);
        assert_eq!(
            OperationResult::failed("Already in wishlist").failure(),
            Some("Already in wishlist")
        );
        let silent = OperationResult {
            success: false,
            ..OperationResult::default()
        };
        assert_eq!(silent.failure(), None);
    }

    #[test]
    fn test_operation_result_wire_format() {
        let result: OperationResult =
            serde_json::from_str(r#"{"success":true,"reviewId":9}"#).unwrap();
        assert!(result.success);
        assert_eq!(result.review_id, Some(ReviewId::new(9)));
        assert_eq!(result.order_id, None);
    }
}
