//! Account management service.
//!
//! A user account owns a profile, a memory store and a chat history. Creating
//! an account produces all three empty; deleting it removes all three.

use chrono::Utc;
use tracing::{info, warn};

use doppel_types::error::{AccountError, RepositoryError};
use doppel_types::user::UserProfile;

use crate::repository::history::HistoryRepository;
use crate::repository::user::UserRepository;

/// Service orchestrating the account lifecycle.
///
/// Generic over repository traits so doppel-core never depends on doppel-infra.
pub struct AccountService<U: UserRepository, H: HistoryRepository> {
    user_repo: U,
    history_repo: H,
}

impl<U: UserRepository, H: HistoryRepository> AccountService<U, H> {
    pub fn new(user_repo: U, history_repo: H) -> Self {
        Self {
            user_repo,
            history_repo,
        }
    }

    pub fn user_repo(&self) -> &U {
        &self.user_repo
    }

    pub fn history_repo(&self) -> &H {
        &self.history_repo
    }

    /// Create an account with an empty memory and chat history.
    pub async fn create(
        &self,
        username: &str,
        starting_command: Option<String>,
    ) -> Result<UserProfile, AccountError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccountError::InvalidUsername(
                "username cannot be empty".to_string(),
            ));
        }

        let profile = UserProfile::new(username, starting_command);
        self.user_repo
            .create_user(&profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::AlreadyExists(username.to_string()),
                other => AccountError::Storage(other),
            })?;
        self.history_repo.delete_history(username).await?;

        info!(username, "account created");
        Ok(profile)
    }

    /// Get an account's profile.
    pub async fn get(&self, username: &str) -> Result<UserProfile, AccountError> {
        self.user_repo
            .get_user(username.trim())
            .await?
            .ok_or_else(|| AccountError::NotFound(username.trim().to_string()))
    }

    /// All usernames, sorted.
    pub async fn list(&self) -> Result<Vec<String>, AccountError> {
        Ok(self.user_repo.list_users().await?)
    }

    /// Delete an account together with its memory and chat history.
    pub async fn delete(&self, username: &str) -> Result<(), AccountError> {
        let username = username.trim();
        self.user_repo
            .delete_user(username)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AccountError::NotFound(username.to_string()),
                other => AccountError::Storage(other),
            })?;

        if let Err(e) = self.history_repo.delete_history(username).await {
            warn!(username, error = %e, "account deleted but chat history could not be removed");
        }
        info!(username, "account deleted");
        Ok(())
    }

    /// Record a style analysis for an account.
    pub async fn set_analysis(
        &self,
        username: &str,
        analysis: &str,
    ) -> Result<UserProfile, AccountError> {
        let mut profile = self.get(username).await?;
        profile.analysis = Some(analysis.trim().to_string());
        profile.analysis_generated_at = Some(Utc::now());
        self.user_repo.update_user(&profile).await?;
        info!(username = %profile.username, "style analysis updated");
        Ok(profile)
    }
}
