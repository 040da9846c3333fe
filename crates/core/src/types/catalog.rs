//! Catalog records: products, shops and categories.

use serde::{Deserialize, Serialize};

use super::bytes::{base64_option, data_url};
use super::{CategoryId, Price, Principal, ProductId, ShopId};

/// A handmade product listed by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    /// Tags have set semantics but keep the order the seller entered them in.
    pub tags: Vec<String>,
    pub description: String,
    /// Long-form "about this item" narrative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    /// Raw JPEG bytes.
    #[serde(default, with = "base64_option", skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    pub price: Price,
}

impl Product {
    /// Whether the product carries `tag` (exact, case-sensitive match).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Inline image URL, if the product has an image.
    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.image.as_deref().map(|bytes| data_url("image/jpeg", bytes))
    }
}

/// An artisan's shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub owner: Principal,
    pub name: String,
    pub description: String,
    /// Newest last.
    #[serde(default)]
    pub announcements: Vec<String>,
}

/// A browsable category. Products belong to it by carrying a tag equal to
/// the category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}
