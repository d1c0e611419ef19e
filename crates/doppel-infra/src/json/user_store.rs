//! JSON user database.
//!
//! All users live in one JSON object keyed by username:
//!
//! ```json
//! {
//!   "dhairya": {
//!     "created_at": "2025-01-04T10:00:00+00:00",
//!     "starting_command": "Analyze my chat style, tone, language, and reply patterns.",
//!     "analysis": null,
//!     "last_sno": 3,
//!     "learning": [
//!       "legacy bare string",
//!       { "sno": 2, "text": "works nights" },
//!       { "sno": 3, "text": "at the dentist", "expiry": "2025-01-04T12:00:00Z" }
//!     ]
//!   }
//! }
//! ```
//!
//! Every write rewrites the whole file atomically. Fields this crate does not
//! know about are kept as they were.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use doppel_core::repository::fact::FactRepository;
use doppel_core::repository::user::UserRepository;
use doppel_types::error::RepositoryError;
use doppel_types::memory::{FactRecord, Serial, StoredFact, StoredMemory, parse_expiry};
use doppel_types::user::UserProfile;

use crate::filesystem::{io_error, read_optional, write_atomic};

type Database = BTreeMap<String, UserRecord>;

/// One user's entry in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    starting_command: String,
    #[serde(default)]
    analysis: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    analysis_generated_at: Option<DateTime<Utc>>,
    /// Highest serial ever assigned; written once any fact has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sno: Option<u64>,
    #[serde(default)]
    learning: Vec<StoredFact>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            created_at: Some(profile.created_at),
            starting_command: profile.starting_command.clone(),
            analysis: profile.analysis.clone(),
            analysis_generated_at: profile.analysis_generated_at,
            last_sno: None,
            learning: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    fn apply_profile(&mut self, profile: &UserProfile) {
        self.created_at = Some(profile.created_at);
        self.starting_command = profile.starting_command.clone();
        self.analysis = profile.analysis.clone();
        self.analysis_generated_at = profile.analysis_generated_at;
    }

    fn to_profile(&self, username: &str) -> UserProfile {
        UserProfile {
            username: username.to_string(),
            created_at: self.created_at.unwrap_or_default(),
            starting_command: self.starting_command.clone(),
            analysis: self.analysis.clone(),
            analysis_generated_at: self.analysis_generated_at,
        }
    }
}

/// Timestamps that fail to parse are dropped rather than failing the load.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_expiry))
}

/// User and fact repository backed by `users_db.json`.
///
/// Clones share one lock, so operations from the same process never
/// interleave their read-modify-write cycles.
#[derive(Clone)]
pub struct JsonUserStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Database, RepositoryError> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Database::new());
        };
        if content.trim().is_empty() {
            return Ok(Database::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            RepositoryError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write(&self, db: &Database) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(db)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes())
            .await
            .map_err(|e| io_error(&self.path, e))?;
        debug!(path = %self.path.display(), users = db.len(), "user database written");
        Ok(())
    }
}

impl UserRepository for JsonUserStore {
    async fn create_user(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        if db.contains_key(&profile.username) {
            return Err(RepositoryError::Conflict(profile.username.clone()));
        }
        db.insert(profile.username.clone(), UserRecord::from_profile(profile));
        self.write(&db).await
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let _guard = self.lock.lock().await;
        let db = self.read().await?;
        Ok(db.get(username).map(|record| record.to_profile(username)))
    }

    async fn list_users(&self) -> Result<Vec<String>, RepositoryError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.into_keys().collect())
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        let record = db
            .get_mut(&profile.username)
            .ok_or(RepositoryError::NotFound)?;
        record.apply_profile(profile);
        self.write(&db).await
    }

    async fn delete_user(&self, username: &str) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        if db.remove(username).is_none() {
            return Err(RepositoryError::NotFound);
        }
        self.write(&db).await
    }
}

impl FactRepository for JsonUserStore {
    async fn load_facts(&self, username: &str) -> Result<StoredMemory, RepositoryError> {
        let _guard = self.lock.lock().await;
        let db = self.read().await?;
        db.get(username)
            .map(|record| StoredMemory {
                facts: record.learning.clone(),
                last_serial: record.last_sno.filter(|n| *n > 0).map(Serial),
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn save_facts(
        &self,
        username: &str,
        facts: &[FactRecord],
        last_serial: Option<Serial>,
    ) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let mut db = self.read().await?;
        let record = db.get_mut(username).ok_or(RepositoryError::NotFound)?;
        record.learning = facts.iter().map(StoredFact::from).collect();
        record.last_sno = last_serial.map(|s| s.0);
        self.write(&db).await
    }
}
