//! In-memory fakes for the repository and generator ports.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use doppel_types::chat::ChatEntry;
use doppel_types::error::{GeneratorError, RepositoryError};
use doppel_types::memory::{FactRecord, Serial, StoredFact, StoredMemory};
use doppel_types::user::UserProfile;

use crate::generator::Generator;
use crate::repository::fact::FactRepository;
use crate::repository::history::HistoryRepository;
use crate::repository::user::UserRepository;

#[derive(Default)]
struct State {
    users: BTreeMap<String, (UserProfile, StoredMemory)>,
    history: BTreeMap<String, Vec<ChatEntry>>,
}

/// Shared-state fake implementing every repository trait.
#[derive(Clone, Default)]
pub struct FakeRepo {
    state: Arc<Mutex<State>>,
    fail_writes: Arc<AtomicBool>,
}

impl FakeRepo {
    /// A repository holding one user with the given stored facts.
    pub fn with_user(username: &str, facts: Vec<StoredFact>) -> Self {
        let repo = Self::default();
        repo.state.lock().unwrap().users.insert(
            username.to_string(),
            (
                UserProfile::new(username, None),
                StoredMemory {
                    facts,
                    last_serial: None,
                },
            ),
        );
        repo
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The facts as currently persisted.
    pub fn persisted(&self, username: &str) -> Vec<StoredFact> {
        self.state.lock().unwrap().users[username].1.facts.clone()
    }

    /// The high-water serial as currently persisted.
    pub fn persisted_last_serial(&self, username: &str) -> Option<Serial> {
        self.state.lock().unwrap().users[username].1.last_serial
    }

    pub fn history(&self, username: &str) -> Vec<ChatEntry> {
        self.state
            .lock()
            .unwrap()
            .history
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Io("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl FactRepository for FakeRepo {
    async fn load_facts(&self, username: &str) -> Result<StoredMemory, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .users
            .get(username)
            .map(|(_, memory)| memory.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn save_facts(
        &self,
        username: &str,
        facts: &[FactRecord],
        last_serial: Option<Serial>,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let entry = state
            .users
            .get_mut(username)
            .ok_or(RepositoryError::NotFound)?;
        entry.1 = StoredMemory {
            facts: facts.iter().map(StoredFact::from).collect(),
            last_serial,
        };
        Ok(())
    }
}

impl UserRepository for FakeRepo {
    async fn create_user(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(&profile.username) {
            return Err(RepositoryError::Conflict(profile.username.clone()));
        }
        state
            .users
            .insert(profile.username.clone(), (profile.clone(), StoredMemory::default()));
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|(p, _)| p.clone()))
    }

    async fn list_users(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.state.lock().unwrap().users.keys().cloned().collect())
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        let entry = state
            .users
            .get_mut(&profile.username)
            .ok_or(RepositoryError::NotFound)?;
        entry.0 = profile.clone();
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.state
            .lock()
            .unwrap()
            .users
            .remove(username)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl HistoryRepository for FakeRepo {
    async fn load_history(&self, username: &str) -> Result<Vec<ChatEntry>, RepositoryError> {
        Ok(self.history(username))
    }

    async fn append_history(
        &self,
        username: &str,
        entries: &[ChatEntry],
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.state
            .lock()
            .unwrap()
            .history
            .entry(username.to_string())
            .or_default()
            .extend_from_slice(entries);
        Ok(())
    }

    async fn delete_history(&self, username: &str) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().history.remove(username);
        Ok(())
    }
}

/// Generator replaying canned replies and recording the prompts it saw.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    pub prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        let generator = Self::default();
        for reply in replies {
            generator.replies.lock().unwrap().push_back(Ok(reply.to_string()));
        }
        generator
    }

    pub fn failing(message: &str) -> Self {
        let generator = Self::default();
        generator.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        generator
    }
}

impl Generator for ScriptedGenerator {
    async fn generate(&self, system: &str, user_message: &str) -> Result<String, GeneratorError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user_message.to_string()));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(GeneratorError::Failed(message)),
            None => Err(GeneratorError::Unavailable("no scripted reply".to_string())),
        }
    }
}
