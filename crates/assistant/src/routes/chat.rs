//! Chat and transcript handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use shop_assistant_core::{ChatMessage, UserId};
use tracing::{debug, error, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Defaults to the shared guest transcript.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of `POST /history`.
#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ChatMessage>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Answer one chat message and record the exchange.
///
/// A failure to read or write the transcript is logged; the shopper still
/// gets an answer.
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?;
    let user = parse_user_id(request.user_id.as_deref())?.unwrap_or_else(UserId::guest);

    add_breadcrumb("chat", "Message received", Some(&[("user_id", user.as_str())]));

    let history = match state.history().get(&user).await {
        Ok(history) => history,
        Err(err) => {
            warn!(user_id = %user, error = %err, "Could not read chat history, answering without it");
            Vec::new()
        }
    };

    let catalog = state.catalog().snapshot();
    let response = state.responder().reply(message, &catalog, &history).await;
    debug!(user_id = %user, reply_len = response.len(), "Reply ready");

    let exchange = [ChatMessage::user(message), ChatMessage::bot(response.clone())];
    if let Err(err) = state.history().append(&user, &exchange).await {
        let event_id = sentry::capture_error(&err);
        error!(
            user_id = %user,
            error = %err,
            sentry_event_id = %event_id,
            "Failed to save chat history"
        );
    }

    Ok(Json(ChatResponse { response }))
}

/// Return a user's transcript, oldest first.
#[instrument(skip(state, payload))]
pub async fn history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Json<HistoryResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let user = parse_user_id(request.user_id.as_deref())?
        .ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?;

    let history = state.history().get(&user).await?;
    Ok(Json(HistoryResponse { history }))
}

/// `None` for a missing or blank id.
fn parse_user_id(raw: Option<&str>) -> Result<Option<UserId>> {
    match raw.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Ok(Some(UserId::parse(id)?)),
        None => Ok(None),
    }
}
