use thiserror::Error;

/// Errors from repository operations (used by trait definitions in doppel-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by memory store operations.
///
/// Duplicate saves and deletes that match nothing are expected outcomes and
/// never surface here; only persistence failures do.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory persistence failed: {0}")]
    Persistence(#[from] RepositoryError),
}

/// A time string that does not match `<digits><s|m|h|d>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time format: '{0}' (use like '30s', '10m', '1h', '2d')")]
pub struct InvalidTimeFormat(pub String);

/// Errors related to user accounts.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("user '{0}' not found")]
    NotFound(String),

    #[error("user '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from the external reply generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator failed: {0}")]
    Failed(String),
}

/// Errors that abort a conversational turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("chat history error: {0}")]
    History(#[from] RepositoryError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Io("disk full".to_string());
        assert_eq!(err.to_string(), "io error: disk full");
    }

    #[test]
    fn test_memory_error_wraps_repository_error() {
        let err: MemoryError = RepositoryError::Serialization("bad json".to_string()).into();
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_invalid_time_format_display() {
        let err = InvalidTimeFormat("1w".to_string());
        assert!(err.to_string().contains("'1w'"));
    }

    #[test]
    fn test_account_error_display() {
        let err = AccountError::AlreadyExists("dhairya".to_string());
        assert_eq!(err.to_string(), "user 'dhairya' already exists");
    }
}
