//! File-per-user history store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use shop_assistant_core::{ChatMessage, UserId};
use tracing::warn;

use super::{HistoryError, HistoryStore};
use crate::fs::write_atomic;

/// Stores each transcript as `{dir}/{user_id}.json`.
///
/// Read-modify-write cycles hold a per-user async lock, so concurrent
/// requests from one user are serialized while different users never wait on
/// each other. Missing or malformed files read as an empty transcript.
#[derive(Debug)]
pub struct FileHistoryStore {
    dir: PathBuf,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileHistoryStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding the transcript files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user: &UserId) -> PathBuf {
        // UserId only admits [A-Za-z0-9_-], so it is a safe file name.
        self.dir.join(format!("{}.json", user.as_str()))
    }

    /// Lock for one user's file.
    ///
    /// Entries nobody holds are dropped first, so the map only grows with the
    /// number of users writing at the same time.
    fn lock_for(&self, user: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(user.clone()).or_default())
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn read(&self, user: &UserId) -> Result<Vec<ChatMessage>, HistoryError> {
        let path = self.path_for(user);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(HistoryError::Io { path, source }),
        };

        match serde_json::from_str(&contents) {
            Ok(history) => Ok(history),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Malformed history file, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, user: &UserId, history: &[ChatMessage]) -> Result<(), HistoryError> {
        let path = self.path_for(user);
        let contents = serde_json::to_vec_pretty(history)?;
        write_atomic(&path, &contents)
            .await
            .map_err(|source| HistoryError::Io { path, source })
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn get(&self, user: &UserId) -> Result<Vec<ChatMessage>, HistoryError> {
        self.read(user).await
    }

    async fn save(&self, user: &UserId, history: &[ChatMessage]) -> Result<(), HistoryError> {
        let lock = self.lock_for(user);
        let _guard = lock.lock().await;
        self.write(user, history).await
    }

    async fn append(
        &self,
        user: &UserId,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let lock = self.lock_for(user);
        let _guard = lock.lock().await;

        let mut history = self.read(user).await?;
        history.extend_from_slice(messages);
        self.write(user, &history).await?;
        Ok(history)
    }
}
