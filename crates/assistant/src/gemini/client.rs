//! Generative Language API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use tracing::{instrument, warn};

use crate::config::GeminiConfig;
use crate::reply::{GeneratorError, TextGenerator};

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Text generation client for one configured model.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                generation_config: GenerationConfig {
                    temperature: config.temperature,
                    top_k: config.top_k,
                    top_p: config.top_p,
                    max_output_tokens: config.max_output_tokens,
                },
            }),
        })
    }

    /// Model id requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE_URL}/models/{}:generateContent", self.inner.model)
    }

    /// Generate a reply to a single prompt.
    ///
    /// Transient server and connection failures are retried once.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails, times out, is rate limited, or
    /// yields no text.
    #[instrument(skip(self, prompt), fields(model = %self.inner.model, prompt_len = prompt.len()))]
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: self.inner.generation_config,
        };

        let mut attempt = 1;
        loop {
            match self.send(&request).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < MAX_ATTEMPTS && err.is_transient() => {
                    warn!(attempt, error = %err, "Generation failed, retrying");
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<String, GeminiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.inner.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        let body = response.text().await.map_err(from_reqwest)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        parsed.text().ok_or_else(|| {
            GeminiError::Empty(
                parsed
                    .block_reason()
                    .map_or_else(|| "no candidates".to_string(), |reason| format!("blocked: {reason}")),
            )
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        Ok(self.generate_content(prompt).await?)
    }
}

fn from_reqwest(err: reqwest::Error) -> GeminiError {
    if err.is_timeout() {
        GeminiError::Timeout
    } else {
        GeminiError::Http(err)
    }
}

/// Handle an error status code.
async fn handle_error_status(status: StatusCode, response: reqwest::Response) -> GeminiError {
    // Check for rate limiting
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return GeminiError::RateLimited(retry_after);
    }

    // Check for unauthorized
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return GeminiError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => classify_error_body(status, &body),
        Err(e) => from_reqwest(e),
    }
}

/// Map an error body to a typed error; quota exhaustion counts as rate limiting.
fn classify_error_body(status: StatusCode, body: &str) -> GeminiError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_error) => {
            let error = api_error.error;
            if error.status == "RESOURCE_EXHAUSTED" || error.message.to_lowercase().contains("quota") {
                GeminiError::RateLimited(DEFAULT_RETRY_AFTER_SECS)
            } else {
                GeminiError::Api {
                    status: error.status,
                    message: error.message,
                }
            }
        }
        Err(_) => GeminiError::Api {
            status: status.as_str().to_string(),
            message: body.to_string(),
        },
    }
}
