//! Custom order requests.

use serde::{Deserialize, Serialize};

use super::{CustomOrderStatus, OrderId, Principal, ShopId};

/// A free-text request from a caller asking a shop to make something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrderRequest {
    pub id: OrderId,
    /// Raw status string as tracked by the backend.
    pub status: String,
    pub shop_id: ShopId,
    pub user_id: Principal,
    pub description: String,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
}

impl CustomOrderRequest {
    /// Parsed status.
    #[must_use]
    pub fn status(&self) -> CustomOrderStatus {
        CustomOrderStatus::parse(&self.status)
    }
}
