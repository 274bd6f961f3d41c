//! Error types for the text generation client.

use thiserror::Error;

use crate::reply::GeneratorError;

/// Errors that can occur when calling the Generative Language API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the timeout.
    #[error("request timed out")]
    Timeout,

    /// The API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// Status string from the API (e.g. `INVALID_ARGUMENT`).
        status: String,
        /// Error message.
        message: String,
    },

    /// Rate limited or out of quota.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The response carried no text.
    #[error("empty response: {0}")]
    Empty(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_request(),
            Self::Api { status, .. } => matches!(status.as_str(), "INTERNAL" | "UNAVAILABLE"),
            _ => false,
        }
    }
}

impl From<GeminiError> for GeneratorError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::RateLimited(_) => Self::RateLimited,
            GeminiError::Timeout => Self::Timeout,
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Error envelope returned by the API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Numeric HTTP code.
    #[serde(default)]
    pub code: u16,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Canonical status string.
    #[serde(default)]
    pub status: String,
}
