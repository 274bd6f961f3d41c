//! Turning a shopper question into reply text.
//!
//! Two modes share the same matching heuristics:
//!
//! - **Canned**: the ordered keyword rules in [`rules`] pick a reply built
//!   from product cards and fixed answers.
//! - **Generative**: the best-matching products, recent chat turns and the
//!   question are sent to a [`TextGenerator`]. Product titles in the answer
//!   are turned into storefront links.
//!
//! Replies never fail. Generator errors become an apology, except rate
//! limiting which falls back to the canned rules.

pub mod format;
mod generative;
pub mod rules;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{instrument, warn};

use shop_assistant_core::ChatMessage;
use shop_assistant_core::matching::{QueryTerms, top_k};

use crate::catalog::Catalog;
use crate::config::ReplyMode;

pub use format::FormatContext;
pub use generative::{HISTORY_TURNS, build_prompt, link_product_titles};
pub use rules::{Inquiry, Routed, Shop};

/// Reply used whenever the catalog has no products.
pub const NO_DATA_MESSAGE: &str = "I don't have any product information available right now. \
                                   Please try again once the catalog has been loaded.";

/// Reply used when the text generator fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I'm having trouble answering right now. Please try again in a moment.";

/// Upper bound on one generator call, retries included.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(35);

/// Failure of a text generation backend.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The backend refused the call because of rate limits or quota.
    #[error("generator rate limited")]
    RateLimited,

    /// No answer within the allowed time.
    #[error("generator timed out")]
    Timeout,

    /// Any other failure.
    #[error("generation failed: {0}")]
    Failed(String),
}

/// A backend that completes a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Produces replies for one storefront.
#[derive(Clone)]
pub struct Responder {
    store_name: String,
    base_url: Option<String>,
    context_limit: usize,
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("store_name", &self.store_name)
            .field("base_url", &self.base_url)
            .field("mode", &self.mode())
            .field("context_limit", &self.context_limit)
            .finish_non_exhaustive()
    }
}

impl Responder {
    /// A responder that only uses the keyword rules.
    #[must_use]
    pub fn canned(store_name: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            store_name: store_name.into(),
            base_url,
            context_limit: shop_assistant_core::matching::DEFAULT_TOP_K,
            generator: None,
            timeout: GENERATION_TIMEOUT,
        }
    }

    /// A responder that forwards questions to `generator`.
    #[must_use]
    pub fn generative(
        store_name: impl Into<String>,
        base_url: Option<String>,
        generator: Arc<dyn TextGenerator>,
        context_limit: usize,
    ) -> Self {
        Self {
            generator: Some(generator),
            context_limit: context_limit.max(1),
            ..Self::canned(store_name, base_url)
        }
    }

    /// Override the generator timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> ReplyMode {
        if self.generator.is_some() {
            ReplyMode::Generative
        } else {
            ReplyMode::Canned
        }
    }

    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Formatting values for a catalog snapshot.
    #[must_use]
    pub fn format_context(&self, catalog: &Catalog) -> FormatContext {
        FormatContext::new(catalog.currency, self.base_url.clone())
    }

    /// Run the keyword rules.
    #[must_use]
    pub fn canned_reply(&self, question: &str, catalog: &Catalog) -> Routed {
        let format = self.format_context(catalog);
        let shop = Shop {
            products: &catalog.products,
            format: &format,
            store_name: &self.store_name,
        };
        rules::route(&Inquiry::new(question), &shop)
    }

    /// Answer a question against a catalog snapshot.
    ///
    /// `history` is the user's transcript before this question, oldest first.
    #[instrument(skip(self, catalog, history), fields(mode = ?self.mode(), products = catalog.len()))]
    pub async fn reply(&self, question: &str, catalog: &Catalog, history: &[ChatMessage]) -> String {
        let Some(generator) = &self.generator else {
            return self.canned_reply(question, catalog).text;
        };

        if catalog.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        let format = self.format_context(catalog);
        let selected = top_k(&QueryTerms::parse(question), &catalog.products, self.context_limit);
        let prompt = build_prompt(&self.store_name, &format, &selected, history, question);

        let outcome = match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GeneratorError::Timeout),
        };

        match outcome {
            Ok(text) => link_product_titles(text.trim(), &format, &catalog.products),
            Err(GeneratorError::RateLimited) => {
                warn!("Generator rate limited, using keyword rules");
                self.canned_reply(question, catalog).text
            }
            Err(err) => {
                warn!(error = %err, "Generator failed");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }
}
