//! HistoryRepository trait definition.

use doppel_types::chat::ChatEntry;
use doppel_types::error::RepositoryError;

/// Repository trait for per-user chat history.
pub trait HistoryRepository: Send + Sync {
    /// Load the full history. A user without history yields an empty vector.
    fn load_history(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatEntry>, RepositoryError>> + Send;

    /// Append entries to the end of the history.
    fn append_history(
        &self,
        username: &str,
        entries: &[ChatEntry],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove the history. No-op if there is none.
    fn delete_history(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
