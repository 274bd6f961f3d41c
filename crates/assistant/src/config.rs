//! Assistant configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Server
//! - `ASSISTANT_HOST` - Bind address (default: 127.0.0.1)
//! - `ASSISTANT_PORT` / `PORT` - Listen port (default: 5000)
//! - `ALLOWED_ORIGIN` - CORS origin allowed to call the API (default: any)
//!
//! ## Store
//! - `STORE_DISPLAY_NAME` - Name used in canned replies (default: "our store")
//! - `STORE_BASE_URL` - Storefront URL for product links
//!   (default: `https://{SHOP_NAME}.myshopify.com`)
//! - `DEFAULT_CURRENCY` - Currency used until the shop currency is known (default: USD)
//!
//! ## Shopify Admin API (catalog refresh is disabled without a key)
//! - `SHOPIFY_API_KEY` - Admin API access token
//! - `SHOP_NAME` - Shop identifier (`my-shop` or `my-shop.myshopify.com`), required with a key
//! - `SHOPIFY_API_VERSION` - REST API version (default: 2024-10)
//! - `SHOPIFY_WEBHOOK_SECRET` - Verifies `X-Shopify-Hmac-Sha256` on webhooks when set
//!
//! ## Text generation (generative replies are disabled without a key)
//! - `GEMINI_API_KEY` - Generative Language API key
//! - `GEMINI_MODEL` - Model id (default: gemini-1.5-pro)
//! - `GEMINI_TEMPERATURE` - Sampling temperature (default: 0.7)
//! - `GEMINI_TOP_K` - Top-k sampling (default: 40)
//! - `GEMINI_TOP_P` - Nucleus sampling (default: 0.95)
//! - `GEMINI_MAX_OUTPUT_TOKENS` - Reply length cap (default: 1024)
//! - `ASSISTANT_REPLY_MODE` - `canned` or `generative`
//!   (default: generative when a Gemini key is set, otherwise canned)
//!
//! ## Storage
//! - `CATALOG_CACHE_PATH` - Catalog cache file (default: data/products.json)
//! - `CHAT_HISTORY_DIR` - Directory of per-user transcripts (default: data/chat_history)
//! - `CATALOG_REFRESH_SECS` - Background refresh period (default: 3600)
//! - `CATALOG_CONTEXT_LIMIT` - Products passed to the generator (default: 12)
//!
//! ## Observability
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use shop_assistant_core::CurrencyCode;
use shop_assistant_core::matching::DEFAULT_TOP_K;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// How chat replies are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Keyword rules and product cards only.
    Canned,
    /// Forward a prompt with matched products to the text generator.
    Generative,
}

impl FromStr for ReplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canned" => Ok(Self::Canned),
            "generative" => Ok(Self::Generative),
            other => Err(format!("expected 'canned' or 'generative', got '{other}'")),
        }
    }
}

/// Assistant application configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed by CORS; `None` allows any origin
    pub allowed_origin: Option<String>,
    /// Storefront presentation settings
    pub store: StoreConfig,
    /// Shopify Admin API settings, when catalog refresh is enabled
    pub shopify: Option<ShopifyAdminConfig>,
    /// Text generation settings, when generative replies are enabled
    pub gemini: Option<GeminiConfig>,
    /// Reply strategy
    pub reply_mode: ReplyMode,
    /// Catalog cache and refresh settings
    pub catalog: CatalogConfig,
    /// Directory holding one transcript file per user
    pub history_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// How the store presents itself in replies.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name used in greetings and help text
    pub display_name: String,
    /// Base URL for `/products/{handle}` links
    pub base_url: Option<String>,
    /// Currency used until a refresh reports the shop currency
    pub default_currency: CurrencyCode,
}

/// Shopify Admin REST API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyAdminConfig {
    /// Shop identifier without the `.myshopify.com` suffix
    pub shop_name: String,
    /// Admin API version (e.g., 2024-10)
    pub api_version: String,
    /// Admin API access token
    pub api_key: SecretString,
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: Option<SecretString>,
}

impl ShopifyAdminConfig {
    /// Base URL of the versioned Admin REST API.
    #[must_use]
    pub fn admin_base_url(&self) -> String {
        format!(
            "https://{}.myshopify.com/admin/api/{}",
            self.shop_name, self.api_version
        )
    }
}

impl std::fmt::Debug for ShopifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminConfig")
            .field("shop_name", &self.shop_name)
            .field("api_version", &self.api_version)
            .field("api_key", &"[REDACTED]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Generative Language API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: SecretString,
    /// Model id (e.g., gemini-1.5-pro)
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// Catalog cache and refresh configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// JSON cache file
    pub cache_path: PathBuf,
    /// Period between background refreshes
    pub refresh_interval: Duration,
    /// Number of products selected as generator context
    pub context_limit: usize,
}

impl AssistantConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if API keys fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`AssistantConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env.parsed("ASSISTANT_HOST", "127.0.0.1")?;
        let port = match env.optional("ASSISTANT_PORT") {
            Some(_) => env.parsed("ASSISTANT_PORT", "5000")?,
            None => env.parsed("PORT", "5000")?,
        };
        let allowed_origin = env
            .optional("ALLOWED_ORIGIN")
            .filter(|origin| origin != "*");

        let shopify = ShopifyAdminConfig::from_env(&env)?;
        let gemini = GeminiConfig::from_env(&env)?;

        let reply_mode = match env.optional("ASSISTANT_REPLY_MODE") {
            Some(raw) => raw
                .parse::<ReplyMode>()
                .map_err(|e| ConfigError::InvalidEnvVar("ASSISTANT_REPLY_MODE".to_string(), e))?,
            None if gemini.is_some() => ReplyMode::Generative,
            None => ReplyMode::Canned,
        };
        if reply_mode == ReplyMode::Generative && gemini.is_none() {
            return Err(ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }

        let store = StoreConfig {
            display_name: env.or_default("STORE_DISPLAY_NAME", "our store"),
            base_url: env
                .optional("STORE_BASE_URL")
                .or_else(|| {
                    shopify
                        .as_ref()
                        .map(|s| format!("https://{}.myshopify.com", s.shop_name))
                })
                .map(|url| url.trim_end_matches('/').to_string()),
            default_currency: env
                .or_default("DEFAULT_CURRENCY", "USD")
                .parse()
                .map_err(|e: shop_assistant_core::CurrencyCodeError| {
                    ConfigError::InvalidEnvVar("DEFAULT_CURRENCY".to_string(), e.to_string())
                })?,
        };

        let catalog = CatalogConfig {
            cache_path: PathBuf::from(env.or_default("CATALOG_CACHE_PATH", "data/products.json")),
            refresh_interval: Duration::from_secs(env.parsed("CATALOG_REFRESH_SECS", "3600")?),
            context_limit: env.parsed("CATALOG_CONTEXT_LIMIT", &DEFAULT_TOP_K.to_string())?,
        };

        Ok(Self {
            host,
            port,
            allowed_origin,
            store,
            shopify,
            gemini,
            reply_mode,
            catalog,
            history_dir: PathBuf::from(env.or_default("CHAT_HISTORY_DIR", "data/chat_history")),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAdminConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env.optional("SHOPIFY_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "SHOPIFY_API_KEY")?;

        let shop_name = normalize_shop_name(&env.required("SHOP_NAME")?);
        if shop_name.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOP_NAME".to_string(),
                "shop name is empty".to_string(),
            ));
        }

        Ok(Some(Self {
            shop_name,
            api_version: env.or_default("SHOPIFY_API_VERSION", "2024-10"),
            api_key: SecretString::from(api_key),
            webhook_secret: env.optional("SHOPIFY_WEBHOOK_SECRET").map(SecretString::from),
        }))
    }
}

impl GeminiConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env.optional("GEMINI_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "GEMINI_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: env.or_default("GEMINI_MODEL", "gemini-1.5-pro"),
            temperature: env.parsed("GEMINI_TEMPERATURE", "0.7")?,
            top_k: env.parsed("GEMINI_TOP_K", "40")?,
            top_p: env.parsed("GEMINI_TOP_P", "0.95")?,
            max_output_tokens: env.parsed("GEMINI_MAX_OUTPUT_TOKENS", "1024")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source used while loading; blank values count as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Reduce `https://my-shop.myshopify.com/` or `my-shop.myshopify.com` to `my-shop`.
fn normalize_shop_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme.trim_end_matches('/');
    host.strip_suffix(".myshopify.com")
        .unwrap_or(host)
        .to_string()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}
