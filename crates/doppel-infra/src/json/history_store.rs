//! Per-user chat history files.
//!
//! Each user's history is a JSON array of entries in
//! `{chat_dir}/{safe_username}_chat.json`.

use std::path::{Path, PathBuf};

use tracing::debug;

use doppel_core::repository::history::HistoryRepository;
use doppel_types::chat::ChatEntry;
use doppel_types::error::RepositoryError;

use crate::filesystem::{chat_history_path, io_error, read_optional, write_atomic};

/// History repository storing one JSON file per user.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, username: &str) -> PathBuf {
        chat_history_path(&self.dir, username)
    }
}

impl HistoryRepository for JsonHistoryStore {
    async fn load_history(&self, username: &str) -> Result<Vec<ChatEntry>, RepositoryError> {
        let path = self.path(username);
        let Some(content) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", path.display())))
    }

    async fn append_history(
        &self,
        username: &str,
        entries: &[ChatEntry],
    ) -> Result<(), RepositoryError> {
        let mut history = self.load_history(username).await?;
        history.extend_from_slice(entries);

        let path = self.path(username);
        let json = serde_json::to_string_pretty(&history)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        write_atomic(&path, json.as_bytes())
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!(username, total = history.len(), "chat history appended");
        Ok(())
    }

    async fn delete_history(&self, username: &str) -> Result<(), RepositoryError> {
        let path = self.path(username);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}
