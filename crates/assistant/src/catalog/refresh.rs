//! Catalog refresh from Shopify.
//!
//! A [`Refresher`] runs for the life of the server. It refreshes once at
//! startup, then on every interval tick and whenever the product webhook
//! notifies it. A failed refresh keeps the previous snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shop_assistant_core::{
    CollectionRef, CurrencyCode, InventoryItemId, InventoryLevel, Product, ProductId,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{Catalog, CatalogError, CatalogHandle, cache};
use crate::shopify::{PriceRule, ShopifyClient, ShopifyError};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Fetch a complete catalog: products with their collections, price rules
/// and inventory levels, plus the shop currency.
///
/// Everything beyond the product listing is best effort; failures there are
/// logged and the products are still returned.
///
/// # Errors
///
/// Returns an error if the product listing cannot be fetched.
pub async fn fetch_catalog(
    client: &ShopifyClient,
    fallback_currency: CurrencyCode,
) -> Result<Catalog, ShopifyError> {
    let mut products = client.fetch_products().await?;

    match client.fetch_collections_by_product().await {
        Ok(collections) => attach_collections(&mut products, collections),
        Err(err) => warn!(error = %err, "Could not fetch collections, continuing without them"),
    }

    match client.fetch_price_rules().await {
        Ok(rules) => attach_discount_rules(&mut products, &rules),
        Err(err) => warn!(error = %err, "Could not fetch price rules, continuing without them"),
    }

    let item_ids = inventory_item_ids(&products);
    if !item_ids.is_empty() {
        match client.fetch_inventory_levels(&item_ids).await {
            Ok(levels) => attach_inventory_levels(&mut products, levels),
            Err(err) => warn!(error = %err, "Could not fetch inventory levels, continuing without them"),
        }
    }

    let currency = match client.fetch_shop().await {
        Ok(shop) => resolve_currency(shop.currency.as_deref(), fallback_currency),
        Err(err) => {
            warn!(error = %err, "Could not fetch shop currency, keeping {fallback_currency}");
            fallback_currency
        }
    };

    Ok(Catalog {
        currency,
        fetched_at: Some(Utc::now()),
        products,
    })
}

/// Fetch, persist, and publish a new snapshot.
///
/// A cache write failure is logged; the new snapshot is still published.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn refresh_once(
    client: &ShopifyClient,
    handle: &CatalogHandle,
    cache_path: &Path,
) -> Result<usize, CatalogError> {
    let fallback_currency = handle.snapshot().currency;
    let catalog = fetch_catalog(client, fallback_currency).await?;
    let count = catalog.len();

    if let Err(err) = cache::save(cache_path, &catalog).await {
        warn!(error = %err, "Could not write catalog cache");
    }
    handle.replace(catalog);

    info!(products = count, "Catalog refreshed");
    Ok(count)
}

fn attach_collections(
    products: &mut [Product],
    mut collections: HashMap<ProductId, Vec<CollectionRef>>,
) {
    for product in products {
        product.collections = collections.remove(&product.id).unwrap_or_default();
    }
}

fn attach_discount_rules(products: &mut [Product], rules: &[PriceRule]) {
    for product in products {
        product.discount_rules = rules
            .iter()
            .filter(|rule| rule.applies_to(product.id))
            .map(|rule| rule.discount.clone())
            .collect();
    }
}

fn inventory_item_ids(products: &[Product]) -> Vec<InventoryItemId> {
    let mut ids: Vec<InventoryItemId> = products
        .iter()
        .flat_map(|p| &p.variants)
        .filter_map(|v| v.inventory_item_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn attach_inventory_levels(
    products: &mut [Product],
    levels: HashMap<InventoryItemId, Vec<InventoryLevel>>,
) {
    for variant in products.iter_mut().flat_map(|p| &mut p.variants) {
        variant.inventory_levels = variant
            .inventory_item_id
            .and_then(|id| levels.get(&id).cloned())
            .unwrap_or_default();
    }
}

fn resolve_currency(shop_currency: Option<&str>, fallback: CurrencyCode) -> CurrencyCode {
    match shop_currency.map(str::parse::<CurrencyCode>) {
        Some(Ok(currency)) => currency,
        Some(Err(err)) => {
            warn!(error = %err, "Shop currency not supported, keeping {fallback}");
            fallback
        }
        None => fallback,
    }
}

/// Background task keeping the catalog current.
pub struct Refresher {
    client: ShopifyClient,
    catalog: Arc<CatalogHandle>,
    cache_path: PathBuf,
    interval: Duration,
    trigger: Arc<Notify>,
}

impl Refresher {
    #[must_use]
    pub fn new(
        client: ShopifyClient,
        catalog: Arc<CatalogHandle>,
        cache_path: PathBuf,
        interval: Duration,
        trigger: Arc<Notify>,
    ) -> Self {
        Self {
            client,
            catalog,
            cache_path,
            interval: interval.max(MIN_REFRESH_INTERVAL),
            trigger,
        }
    }

    /// Start the refresh loop on the current runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => debug!("Scheduled catalog refresh"),
                () = self.trigger.notified() => {
                    info!("Catalog refresh requested");
                    ticker.reset();
                }
            }

            if let Err(err) = refresh_once(&self.client, &self.catalog, &self.cache_path).await {
                let event_id = sentry::capture_error(&err);
                error!(
                    error = %err,
                    sentry_event_id = %event_id,
                    "Catalog refresh failed, keeping previous snapshot"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shop_assistant_core::CollectionId;

    use super::*;

    #[test]
    fn test_attach_collections() {
        let mut products: Vec<Product> =
            serde_json::from_str(r#"[{"id": 1, "title": "Belt"}, {"id": 2, "title": "Scarf"}]"#)
                .unwrap();
        let mut collections = HashMap::new();
        collections.insert(
            ProductId::new(2),
            vec![CollectionRef {
                id: CollectionId::new(7),
                title: "Winter".to_string(),
                kind: "custom".to_string(),
            }],
        );

        attach_collections(&mut products, collections);

        assert!(products[0].collections.is_empty());
        assert_eq!(products[1].collections[0].title, "Winter");
    }

    #[test]
    fn test_attach_discount_rules() {
        let mut products: Vec<Product> =
            serde_json::from_str(r#"[{"id": 1, "title": "Belt"}, {"id": 2, "title": "Scarf"}]"#)
                .unwrap();
        let rules: Vec<PriceRule> = serde_json::from_str(
            r#"[
                {"id": 10, "title": "BELTS15", "value_type": "percentage", "value": "-15.0",
                 "target_selection": "entitled", "entitled_product_ids": [1]},
                {"id": 11, "title": "SITEWIDE", "value_type": "fixed_amount", "value": "-5.0",
                 "target_selection": "all"}
            ]"#,
        )
        .unwrap();

        attach_discount_rules(&mut products, &rules);

        let titles = |p: &Product| -> Vec<String> {
            p.discount_rules.iter().map(|r| r.title.clone()).collect()
        };
        assert_eq!(titles(&products[0]), ["BELTS15", "SITEWIDE"]);
        assert_eq!(titles(&products[1]), ["SITEWIDE"]);
    }

    #[test]
    fn test_attach_inventory_levels() {
        let mut products: Vec<Product> = serde_json::from_str(
            r#"[{"id": 1, "title": "Belt", "variants": [
                    {"id": 11, "inventory_item_id": 500, "inventory_quantity": 1},
                    {"id": 12, "inventory_item_id": 501},
                    {"id": 13}
                ]},
                {"id": 2, "title": "Scarf", "variants": [{"id": 21, "inventory_item_id": 500}]}]"#,
        )
        .unwrap();
        assert_eq!(
            inventory_item_ids(&products),
            [InventoryItemId::new(500), InventoryItemId::new(501)]
        );

        let level: InventoryLevel =
            serde_json::from_str(r#"{"available": 6, "location_id": 3}"#).unwrap();
        let mut levels = HashMap::new();
        levels.insert(InventoryItemId::new(500), vec![level.clone(), level]);

        attach_inventory_levels(&mut products, levels);

        assert_eq!(products[0].variants[0].available_quantity(), Some(12));
        assert!(products[0].variants[1].inventory_levels.is_empty());
        assert_eq!(products[0].variants[1].available_quantity(), None);
        assert_eq!(products[1].variants[0].inventory_levels.len(), 2);
    }

    #[test]
    fn test_resolve_currency() {
        assert_eq!(
            resolve_currency(Some("inr"), CurrencyCode::USD),
            CurrencyCode::INR
        );
        assert_eq!(
            resolve_currency(Some("XYZ"), CurrencyCode::EUR),
            CurrencyCode::EUR
        );
        assert_eq!(resolve_currency(None, CurrencyCode::GBP), CurrencyCode::GBP);
    }
}
