//! Per-user chat transcripts.
//!
//! Handlers talk to a [`HistoryStore`] so the backing storage can change
//! without touching the chat flow. Two stores ship with the crate:
//!
//! - [`FileHistoryStore`]: one JSON file per user under a directory
//! - [`InMemoryHistoryStore`]: process-local, for tests and the CLI

mod file;
mod memory;

pub use file::FileHistoryStore;
pub use memory::InMemoryHistoryStore;

use std::path::PathBuf;

use async_trait::async_trait;
use shop_assistant_core::{ChatMessage, UserId};
use thiserror::Error;

/// Errors that can occur when reading or writing chat history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// History file could not be read or written.
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History could not be serialized.
    #[error("History serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage for ordered, append-only chat transcripts.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The full transcript for a user; empty when none exists.
    async fn get(&self, user: &UserId) -> Result<Vec<ChatMessage>, HistoryError>;

    /// Replace a user's transcript.
    async fn save(&self, user: &UserId, history: &[ChatMessage]) -> Result<(), HistoryError>;

    /// Append messages to a user's transcript, returning the new transcript.
    ///
    /// Concurrent appends for the same user must not lose messages.
    async fn append(
        &self,
        user: &UserId,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatMessage>, HistoryError>;
}
