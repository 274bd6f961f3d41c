//! Catalog product records.
//!
//! These mirror the Shopify Admin REST product payload, trimmed to the fields
//! the assistant reads, plus what a catalog refresh joins in from other
//! endpoints: collection references, applicable price rules and per-location
//! inventory levels. A catalog is an immutable `Vec<Product>` snapshot that is
//! replaced wholesale on every refresh.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{CollectionId, InventoryItemId, LocationId, PriceRuleId, ProductId, VariantId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    /// Description markup as returned by the platform.
    #[serde(default, deserialize_with = "null_as_default")]
    pub body_html: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_type: String,
    /// URL slug; product links are only generated when present.
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub collections: Vec<CollectionRef>,
    /// Price rules that apply to this product.
    #[serde(default)]
    pub discount_rules: Vec<DiscountRule>,
}

impl Product {
    /// The variant used for display and price comparisons.
    #[must_use]
    pub fn representative_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// Price of the representative variant.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        self.representative_variant().and_then(|v| v.price)
    }

    /// Compare-at price of the representative variant.
    #[must_use]
    pub fn compare_at_price(&self) -> Option<Decimal> {
        self.representative_variant()
            .and_then(|v| v.compare_at_price)
    }

    /// Whether the representative variant is marked down.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        matches!(
            (self.price(), self.compare_at_price()),
            (Some(price), Some(compare_at)) if compare_at > price
        )
    }

    /// Price rules running at `now`.
    pub fn active_discounts(&self, now: DateTime<Utc>) -> impl Iterator<Item = &DiscountRule> {
        self.discount_rules
            .iter()
            .filter(move |rule| rule.is_active_at(now))
    }

    /// Stock across all variants.
    ///
    /// Variants that report no quantity are left out; when none report one
    /// the product is [`StockLevel::Untracked`].
    #[must_use]
    pub fn stock_level(&self) -> StockLevel {
        let quantities: Vec<i64> = self
            .variants
            .iter()
            .filter_map(Variant::available_quantity)
            .collect();
        if quantities.is_empty() {
            return StockLevel::Untracked;
        }
        let total: i64 = quantities.iter().map(|q| (*q).max(0)).sum();
        let backorder = self.variants.iter().any(Variant::sells_when_out_of_stock);
        match total {
            0 if backorder => StockLevel::Backorder,
            0 => StockLevel::SoldOut,
            n => StockLevel::Available(n),
        }
    }
}

/// Availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    /// No variant reports inventory.
    Untracked,
    /// Units on hand across variants and locations.
    Available(i64),
    /// Nothing on hand but orders are still accepted.
    Backorder,
    SoldOut,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub inventory_policy: Option<String>,
    #[serde(default)]
    pub inventory_management: Option<String>,
    #[serde(default)]
    pub inventory_item_id: Option<InventoryItemId>,
    /// Per-location levels joined in during a refresh.
    #[serde(default)]
    pub inventory_levels: Vec<InventoryLevel>,
}

impl Variant {
    /// Units available, preferring location levels over the variant's own
    /// `inventory_quantity`.
    #[must_use]
    pub fn available_quantity(&self) -> Option<i64> {
        let from_levels: Vec<i64> = self
            .inventory_levels
            .iter()
            .filter_map(|level| level.available)
            .collect();
        if from_levels.is_empty() {
            self.inventory_quantity
        } else {
            Some(from_levels.iter().sum())
        }
    }

    /// Whether the variant keeps selling at zero stock.
    #[must_use]
    pub fn sells_when_out_of_stock(&self) -> bool {
        self.inventory_policy
            .as_deref()
            .is_some_and(|policy| policy.eq_ignore_ascii_case("continue"))
    }
}

/// Stock of one inventory item at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    #[serde(default)]
    pub available: Option<i64>,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A price rule and its discount codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub id: PriceRuleId,
    #[serde(default)]
    pub title: String,
    /// `percentage` or `fixed_amount`.
    #[serde(default)]
    pub value_type: String,
    /// Signed amount as sent by the platform, e.g. `-10.0`.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub codes: Vec<String>,
}

impl DiscountRule {
    /// Started (or has no start) and not yet ended.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| start <= now) && self.ends_at.is_none_or(|end| end > now)
    }

    #[must_use]
    pub fn is_percentage(&self) -> bool {
        self.value_type.eq_ignore_ascii_case("percentage")
    }

    /// Size of the reduction, always positive.
    #[must_use]
    pub fn amount_off(&self) -> Option<Decimal> {
        self.value.map(|v| v.abs()).filter(|v| !v.is_zero())
    }
}

/// A product option such as "Color" or "Size" and its allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A collection the product belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub id: CollectionId,
    #[serde(default)]
    pub title: String,
    /// `custom` or `smart`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Product tags.
///
/// The REST API returns tags as one comma-joined string while cached catalogs
/// may store a list; both forms deserialize to the same value. Tags always
/// serialize as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Build tags from any iterator of strings, trimming and dropping blanks.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Split a comma-joined tag string.
    #[must_use]
    pub fn from_joined(joined: &str) -> Self {
        Self::new(joined.split(','))
    }

    /// Tags in their original order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive membership test.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Tags joined with `", "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTags {
            Joined(String),
            List(Vec<String>),
            Missing(()),
        }

        Ok(match RawTags::deserialize(deserializer)? {
            RawTags::Joined(joined) => Self::from_joined(&joined),
            RawTags::List(list) => Self::new(list),
            RawTags::Missing(()) => Self::default(),
        })
    }
}

/// Deserialize `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a decimal as a string, a JSON number, or null.
///
/// Blank or unparseable strings become `None` rather than failing the whole
/// product.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDecimal {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        match Option::<RawDecimal>::deserialize(deserializer)? {
            Some(RawDecimal::Text(text)) => Decimal::from_str(text.trim()).ok(),
            Some(RawDecimal::Number(number)) => Decimal::from_str(&number.to_string()).ok(),
            None => None,
        },
    )
}
