//! Catalog cache file.
//!
//! Two layouts are read:
//!
//! - a bare JSON array of products
//! - an envelope `{"currency": "USD", "fetched_at": "...", "products": [...]}`
//!
//! Saves always write the envelope.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_assistant_core::{CurrencyCode, Product};
use tracing::{info, warn};

use super::{Catalog, CatalogError};
use crate::fs::write_atomic;

#[derive(Deserialize)]
#[serde(untagged)]
enum CacheFile {
    Envelope(CacheEnvelope),
    Products(Vec<Product>),
}

#[derive(Deserialize)]
struct CacheEnvelope {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    fetched_at: Option<DateTime<Utc>>,
    products: Vec<Product>,
}

#[derive(Serialize)]
struct CacheEnvelopeRef<'a> {
    currency: &'static str,
    fetched_at: Option<DateTime<Utc>>,
    products: &'a [Product],
}

/// Parse cache file contents.
///
/// An unsupported currency code in the envelope falls back to
/// `default_currency`.
///
/// # Errors
///
/// Returns [`CatalogError::Parse`] if the contents match neither layout.
pub fn parse(contents: &str, default_currency: CurrencyCode) -> Result<Catalog, CatalogError> {
    match serde_json::from_str::<CacheFile>(contents)? {
        CacheFile::Products(products) => Ok(Catalog::new(default_currency, products)),
        CacheFile::Envelope(envelope) => {
            let currency = match envelope.currency.as_deref() {
                Some(code) => code.parse().unwrap_or_else(|err| {
                    warn!(error = %err, "Unsupported cached currency, using default");
                    default_currency
                }),
                None => default_currency,
            };
            Ok(Catalog {
                currency,
                fetched_at: envelope.fetched_at,
                products: envelope.products,
            })
        }
    }
}

/// Read the cache file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load(path: &Path, default_currency: CurrencyCode) -> Result<Catalog, CatalogError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse(&contents, default_currency)
}

/// Read the cache file, falling back to an empty catalog when it is missing
/// or malformed.
pub async fn load_or_empty(path: &Path, default_currency: CurrencyCode) -> Catalog {
    match load(path, default_currency).await {
        Ok(catalog) => {
            info!(path = %path.display(), products = catalog.len(), "Loaded catalog cache");
            catalog
        }
        Err(CatalogError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "No catalog cache found, starting empty");
            Catalog::empty(default_currency)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Unreadable catalog cache, starting empty");
            Catalog::empty(default_currency)
        }
    }
}

/// Write the catalog as an envelope, atomically.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn save(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    let envelope = CacheEnvelopeRef {
        currency: catalog.currency.code(),
        fetched_at: catalog.fetched_at,
        products: &catalog.products,
    };
    let contents = serde_json::to_vec_pretty(&envelope)?;
    write_atomic(path, &contents)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BARE: &str = r#"[
        {"id": 1, "title": "Leather Belt", "handle": "leather-belt", "tags": "leather, brown",
         "variants": [{"id": 10, "price": "40.00", "compare_at_price": null}]}
    ]"#;

    #[test]
    fn test_parse_bare_array() {
        let catalog = parse(BARE, CurrencyCode::INR).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.currency, CurrencyCode::INR);
        assert!(catalog.fetched_at.is_none());
    }

    #[test]
    fn test_parse_envelope() {
        let json = r#"{"currency": "EUR", "fetched_at": "2024-05-01T12:00:00Z",
                       "products": [{"id": 1, "title": "Scarf"}]}"#;
        let catalog = parse(json, CurrencyCode::USD).unwrap();
        assert_eq!(catalog.currency, CurrencyCode::EUR);
        assert!(catalog.fetched_at.is_some());
        assert_eq!(catalog.products[0].title, "Scarf");
    }

    #[test]
    fn test_parse_envelope_unknown_currency_uses_default() {
        let json = r#"{"currency": "XYZ", "products": []}"#;
        let catalog = parse(json, CurrencyCode::GBP).unwrap();
        assert_eq!(catalog.currency, CurrencyCode::GBP);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse("{not json", CurrencyCode::USD),
            Err(CatalogError::Parse(_))
        ));
        assert!(parse(r#"{"products": "nope"}"#, CurrencyCode::USD).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_or_empty(&dir.path().join("missing.json"), CurrencyCode::USD).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        tokio::fs::write(&path, "[{\"title\": ").await.unwrap();
        let catalog = load_or_empty(&path, CurrencyCode::USD).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/products.json");
        let mut catalog = parse(BARE, CurrencyCode::CAD).unwrap();
        catalog.fetched_at = Some(Utc::now());

        save(&path, &catalog).await.unwrap();
        let loaded = load(&path, CurrencyCode::USD).await.unwrap();

        assert_eq!(loaded.currency, CurrencyCode::CAD);
        assert_eq!(loaded.products, catalog.products);
    }
}
