//! Shopify webhook handlers.
//!
//! Product create, update and delete webhooks all point at one endpoint that
//! wakes the catalog refresher. When `SHOPIFY_WEBHOOK_SECRET` is set the
//! request must carry a valid `X-Shopify-Hmac-Sha256` signature of the raw
//! body.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Header carrying the base64 HMAC-SHA256 of the body.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
/// Header naming the webhook topic, e.g. `products/update`.
pub const TOPIC_HEADER: &str = "x-shopify-topic";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
}

/// Handle a product change notification.
#[instrument(skip(state, headers, body), fields(topic = tracing::field::Empty))]
pub async fn products_changed(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let shopify = state
        .config()
        .shopify
        .as_ref()
        .filter(|_| state.shopify().is_some())
        .ok_or_else(|| AppError::Unavailable("Catalog refresh is not configured".to_string()))?;

    if let Some(secret) = &shopify.webhook_secret {
        let signature = headers
            .get(HMAC_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;

        if !verify_signature(secret.expose_secret().as_bytes(), &body, signature) {
            warn!("Webhook signature mismatch");
            return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
        }
    }

    let topic = headers
        .get(TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::Span::current().record("topic", topic);
    info!(topic, body_len = body.len(), "Product webhook received, refreshing catalog");

    state.request_refresh();

    Ok(Json(WebhookResponse {
        status: "success".to_string(),
    }))
}

/// Base64 HMAC-SHA256 of `body` under `secret`, as Shopify sends it.
#[must_use]
pub fn sign(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    sign(secret, body).is_some_and(|expected| constant_time_compare(&expected, signature.trim()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
