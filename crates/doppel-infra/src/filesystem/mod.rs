//! Data directory layout and file helpers.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   users_db.json
//!   chat_histories/
//!     {safe_username}_chat.json
//! ```

use std::path::{Path, PathBuf};

use doppel_types::error::RepositoryError;
use doppel_types::user::safe_username;

/// Name of the JSON user database inside the data directory.
pub const USERS_DB_FILE: &str = "users_db.json";

/// Directory holding per-user chat histories.
pub const CHAT_DIR: &str = "chat_histories";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `DOPPEL_DATA_DIR` environment variable
/// 2. `~/.doppel`
/// 3. `./.doppel` when no home directory is known
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DOPPEL_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".doppel");
    }

    PathBuf::from(".doppel")
}

pub fn users_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(USERS_DB_FILE)
}

pub fn chat_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(CHAT_DIR)
}

/// `{chat_dir}/{safe_username}_chat.json`
pub fn chat_history_path(chat_dir: &Path, username: &str) -> PathBuf {
    chat_dir.join(format!("{}_chat.json", safe_username(username)))
}

/// Replace `path` with `contents` without ever exposing a partial file.
///
/// Writes a sibling `.tmp` file and renames it over the target. Parent
/// directories are created as needed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err);
    }
    Ok(())
}

/// Read a file, treating a missing file as `None`.
pub async fn read_optional(path: &Path) -> Result<Option<String>, RepositoryError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path, err)),
    }
}

pub(crate) fn io_error(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
        assert!(!dir.path().join("nested").join("db.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_optional_missing_file() {
        let dir = tempdir().unwrap();
        let content = read_optional(&dir.path().join("missing.json")).await.unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn test_layout_paths() {
        let data_dir = PathBuf::from("/home/user/.doppel");
        assert_eq!(
            users_db_path(&data_dir),
            PathBuf::from("/home/user/.doppel/users_db.json")
        );
        assert_eq!(
            chat_history_path(&chat_dir(&data_dir), "john.doe"),
            PathBuf::from("/home/user/.doppel/chat_histories/johndoe_chat.json")
        );
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("DOPPEL_DATA_DIR", "/tmp/test-doppel");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-doppel"));
        unsafe {
            std::env::remove_var("DOPPEL_DATA_DIR");
        }
    }
}
