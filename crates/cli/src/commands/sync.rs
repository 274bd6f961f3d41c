//! Catalog sync command.
//!
//! # Usage
//!
//! ```bash
//! shop-assistant-cli sync
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_NAME` - Shop identifier (`{shop}.myshopify.com`)
//! - `SHOPIFY_API_KEY` - Admin API access token
//! - `CATALOG_CACHE_PATH` - Where the catalog is written

use shop_assistant::catalog::{cache, refresh};
use shop_assistant::config::AssistantConfig;
use shop_assistant::shopify::ShopifyClient;
use tracing::info;

use super::CliError;

/// Fetch the full catalog and write it to the cache file.
///
/// # Errors
///
/// Returns an error if Shopify is not configured, the fetch fails, or the
/// cache cannot be written.
pub async fn run() -> Result<(), CliError> {
    let config = AssistantConfig::from_env()?;
    let shopify = config
        .shopify
        .as_ref()
        .ok_or(CliError::NotConfigured("Shopify (SHOP_NAME and SHOPIFY_API_KEY)"))?;

    let client = ShopifyClient::new(shopify)?;
    info!(shop = client.shop_name(), "Fetching catalog");

    let catalog = refresh::fetch_catalog(&client, config.store.default_currency).await?;
    cache::save(&config.catalog.cache_path, &catalog).await?;

    info!(
        products = catalog.len(),
        currency = %catalog.currency,
        path = %config.catalog.cache_path.display(),
        "Catalog cache written"
    );
    Ok(())
}
