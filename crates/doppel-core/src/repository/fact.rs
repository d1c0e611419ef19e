//! FactRepository trait definition.

use doppel_types::error::RepositoryError;
use doppel_types::memory::{FactRecord, Serial, StoredMemory};

/// Persistence boundary of a user's memory.
///
/// The whole fact list is read and rewritten in one piece; implementations
/// must never leave a partially written list behind. Round-tripping through
/// `save_facts` and `load_facts` must preserve serial, text and expiry, and
/// the high-water serial.
pub trait FactRepository: Send + Sync {
    /// Load the stored memory of a user, facts in insertion order.
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    fn load_facts(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<StoredMemory, RepositoryError>> + Send;

    /// Replace the stored facts of a user and record the highest serial
    /// assigned so far.
    fn save_facts(
        &self,
        username: &str,
        facts: &[FactRecord],
        last_serial: Option<Serial>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
