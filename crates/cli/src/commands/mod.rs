//! CLI subcommands.

pub mod chat;
pub mod sync;

use shop_assistant::catalog::CatalogError;
use shop_assistant::config::ConfigError;
use shop_assistant::shopify::ShopifyError;
use shop_assistant::state::StateError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Required integration is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Shopify request failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Catalog cache could not be written.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Application state could not be built.
    #[error("Startup error: {0}")]
    State(#[from] StateError),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
