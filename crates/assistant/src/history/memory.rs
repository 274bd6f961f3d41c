//! In-memory history store.

use std::collections::HashMap;

use async_trait::async_trait;
use shop_assistant_core::{ChatMessage, UserId};
use tokio::sync::Mutex;

use super::{HistoryError, HistoryStore};

/// Keeps transcripts in process memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    histories: Mutex<HashMap<UserId, Vec<ChatMessage>>>,
}

impl InMemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get(&self, user: &UserId) -> Result<Vec<ChatMessage>, HistoryError> {
        Ok(self
            .histories
            .lock()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, user: &UserId, history: &[ChatMessage]) -> Result<(), HistoryError> {
        self.histories
            .lock()
            .await
            .insert(user.clone(), history.to_vec());
        Ok(())
    }

    async fn append(
        &self,
        user: &UserId,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let mut histories = self.histories.lock().await;
        let history = histories.entry(user.clone()).or_default();
        history.extend_from_slice(messages);
        Ok(history.clone())
    }
}
