//! Product catalog snapshots.
//!
//! A [`Catalog`] is an immutable snapshot of every product plus the currency
//! its prices are in. [`CatalogHandle`] hands out `Arc` snapshots to request
//! handlers and swaps in a new one after each refresh, so a handler always sees
//! one complete catalog for the whole request.

pub mod cache;
pub mod refresh;

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use shop_assistant_core::{CurrencyCode, Product};
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Errors that can occur while loading, saving, or refreshing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Cache file could not be read or written.
    #[error("Catalog cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file is not a product list or catalog envelope.
    #[error("Malformed catalog cache: {0}")]
    Parse(#[from] serde_json::Error),

    /// Fetching from Shopify failed.
    #[error("Catalog fetch failed: {0}")]
    Shopify(#[from] ShopifyError),
}

/// An immutable catalog snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Currency of every price in `products`.
    pub currency: CurrencyCode,
    /// When the products were fetched, if known.
    pub fetched_at: Option<DateTime<Utc>>,
    pub products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            currency,
            fetched_at: None,
            products: Vec::new(),
        }
    }

    #[must_use]
    pub const fn new(currency: CurrencyCode, products: Vec<Product>) -> Self {
        Self {
            currency,
            fetched_at: None,
            products,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }
}

/// Shared handle to the current catalog snapshot.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the current snapshot wholesale.
    pub fn replace(&self, catalog: Catalog) {
        let next = Arc::new(catalog);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn products(json: &str) -> Vec<Product> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty(CurrencyCode::EUR);
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert_eq!(catalog.currency, CurrencyCode::EUR);
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = CatalogHandle::new(Catalog::new(
            CurrencyCode::USD,
            products(r#"[{"id": 1, "title": "Gift Card"}]"#),
        ));
        let before = handle.snapshot();

        handle.replace(Catalog::new(
            CurrencyCode::INR,
            products(r#"[{"id": 2, "title": "Belt"}, {"id": 3, "title": "Scarf"}]"#),
        ));

        // A snapshot taken earlier is untouched by the swap.
        assert_eq!(before.len(), 1);
        assert_eq!(before.currency, CurrencyCode::USD);

        let after = handle.snapshot();
        assert_eq!(after.len(), 2);
        assert_eq!(after.currency, CurrencyCode::INR);
    }
}
