//! HTTP route handlers for the chat service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//!
//! # Chat
//! POST /chat                   - Answer a question ({message, user_id?} -> {response})
//! POST /history                - A user's transcript ({user_id} -> {history})
//!
//! # Shopify webhooks
//! POST /webhook/products       - Product changed, refresh the catalog
//! ```

pub mod chat;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route("/history", post(chat::history))
        .route("/webhook/products", post(webhooks::products_changed))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify or the
/// text generator.
async fn health() -> &'static str {
    "ok"
}
