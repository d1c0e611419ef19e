//! Application state wiring services to the JSON file adapters.

use std::path::PathBuf;

use anyhow::Context;

use doppel_core::clock::SystemClock;
use doppel_core::memory::store::MemoryStore;
use doppel_core::service::account::AccountService;
use doppel_infra::config::load_config;
use doppel_infra::filesystem::{chat_dir, resolve_data_dir, users_db_path};
use doppel_infra::json::{JsonHistoryStore, JsonUserStore};
use doppel_types::config::DoppelConfig;
use doppel_types::user::UserProfile;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAccountService = AccountService<JsonUserStore, JsonHistoryStore>;

pub type ConcreteMemoryStore = MemoryStore<JsonUserStore, SystemClock>;

/// Shared state for all commands.
pub struct AppState {
    pub accounts: ConcreteAccountService,
    pub users: JsonUserStore,
    pub history: JsonHistoryStore,
    pub config: DoppelConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config and wire the stores.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let users = JsonUserStore::new(users_db_path(&data_dir));
        let history = JsonHistoryStore::new(chat_dir(&data_dir));
        let accounts = AccountService::new(users.clone(), history.clone());

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            accounts,
            users,
            history,
            config,
            data_dir,
        })
    }

    /// Open a user's memory store, migrating legacy entries on the way.
    pub async fn open_memory(&self, username: &str) -> anyhow::Result<(UserProfile, ConcreteMemoryStore)> {
        let profile = self.accounts.get(username).await?;
        let store = MemoryStore::open(self.users.clone(), SystemClock, profile.username.clone())
            .await
            .with_context(|| format!("failed to load memory for '{}'", profile.username))?;
        Ok((profile, store))
    }
}
