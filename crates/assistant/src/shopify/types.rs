//! Admin REST payload types.
//!
//! Products deserialize straight into [`shop_assistant_core::Product`]; the
//! types here cover the remaining endpoints read during a catalog refresh.

use serde::Deserialize;
use shop_assistant_core::{
    CollectionId, CollectionRef, DiscountRule, InventoryItemId, InventoryLevel, ProductId,
};

/// Collection kind as stored on [`CollectionRef::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Custom,
    Smart,
}

impl CollectionKind {
    /// Endpoint path and root key of the listing for this kind.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Custom => "custom_collections",
            Self::Smart => "smart_collections",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Smart => "smart",
        }
    }
}

/// A custom or smart collection listing entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSummary {
    pub id: CollectionId,
    #[serde(default)]
    pub title: Option<String>,
}

impl CollectionSummary {
    #[must_use]
    pub fn into_ref(self, kind: CollectionKind) -> CollectionRef {
        CollectionRef {
            id: self.id,
            title: self.title.unwrap_or_default(),
            kind: kind.as_str().to_string(),
        }
    }
}

/// Membership of a product in a custom collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Collect {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
}

/// A price rule listing entry.
///
/// The shared fields land in [`DiscountRule`]; its codes come from a
/// separate endpoint and start out empty.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRule {
    #[serde(flatten)]
    pub discount: DiscountRule,
    /// `all` or `entitled`.
    #[serde(default)]
    pub target_selection: Option<String>,
    #[serde(default)]
    pub entitled_product_ids: Vec<ProductId>,
}

impl PriceRule {
    /// Whether the rule covers a product.
    #[must_use]
    pub fn applies_to(&self, product_id: ProductId) -> bool {
        self.target_selection.as_deref() == Some("all")
            || self.entitled_product_ids.contains(&product_id)
    }
}

/// A discount code listing entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCode {
    pub code: String,
}

/// An inventory level listing entry.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLevelEntry {
    #[serde(default)]
    pub inventory_item_id: Option<InventoryItemId>,
    #[serde(flatten)]
    pub level: InventoryLevel,
}

/// `GET /shop.json` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopResponse {
    pub shop: Shop,
}

/// Shop settings read by the assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct Shop {
    #[serde(default)]
    pub name: Option<String>,
    /// ISO 4217 code of the shop currency.
    #[serde(default)]
    pub currency: Option<String>,
}
