//! Shopify Admin REST API client (read-only catalog access).
//!
//! # Architecture
//!
//! - Plain REST `GET`s with `reqwest`, authenticated with `X-Shopify-Access-Token`
//! - Cursor pagination through the `Link: <...page_info=...>; rel="next"` header
//! - 15 second timeout per request, three attempts per request
//! - `429` responses wait for `Retry-After` before the next attempt
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_assistant::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&shopify_config)?;
//! let products = client.fetch_products().await?;
//! let collections = client.fetch_collections_by_product().await?;
//! ```

mod client;
pub mod types;

pub use client::ShopifyClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Shopify returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify on every attempt.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ShopifyError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408,
            Self::Parse(_) | Self::Unauthorized(_) | Self::InvalidUrl(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");

        let err = ShopifyError::Status {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Shopify returned 404: Not Found");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ShopifyError::RateLimited(1).is_retryable());
        assert!(
            ShopifyError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ShopifyError::Status {
                status: 404,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ShopifyError::Unauthorized("bad token".to_string()).is_retryable());
    }
}
