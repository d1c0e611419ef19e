//! UserRepository trait definition.

use doppel_types::error::RepositoryError;
use doppel_types::user::UserProfile;

/// Repository trait for user account records.
///
/// A newly created user always starts with an empty memory; deleting a user
/// deletes their memory with it.
pub trait UserRepository: Send + Sync {
    /// Create a user. Returns `RepositoryError::Conflict` if the name is taken.
    fn create_user(
        &self,
        profile: &UserProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a user's profile. Returns `None` if the user does not exist.
    fn get_user(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    /// List all usernames, sorted.
    fn list_users(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    /// Overwrite a user's profile, leaving their memory untouched.
    fn update_user(
        &self,
        profile: &UserProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a user together with their memory.
    fn delete_user(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
