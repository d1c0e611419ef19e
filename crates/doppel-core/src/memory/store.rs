//! The per-user memory store.
//!
//! The repository is the only source of truth. Every mutation reloads the
//! user's facts, applies the change to the fresh list, persists it in full
//! through the [`FactRepository`], and only then adopts it as the in-memory
//! copy. A failed write leaves both the file and the store as they were, and
//! a store held open by a long session never overwrites facts written by
//! another one in between.
//!
//! Callers sharing a user between processes must still serialize the
//! mutations themselves; each one is a read-modify-write of the whole list.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use doppel_types::error::MemoryError;
use doppel_types::memory::{DeleteSelector, FactRecord, SaveOutcome, Serial};

use crate::clock::{Clock, SystemClock};
use crate::memory::migrate::migrate_legacy;
use crate::repository::fact::FactRepository;

/// One user's ordered collection of facts.
pub struct MemoryStore<R: FactRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    username: String,
    records: Vec<FactRecord>,
    /// Highest serial ever assigned to this user.
    last_serial: Option<Serial>,
}

impl<R: FactRepository, C: Clock> MemoryStore<R, C> {
    /// Load a user's memory, migrating legacy entries.
    pub async fn open(repo: R, clock: C, username: impl Into<String>) -> Result<Self, MemoryError> {
        let mut store = Self {
            repo,
            clock,
            username: username.into(),
            records: Vec::new(),
            last_serial: None,
        };
        store.reload().await?;
        Ok(store)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Re-read the user's facts from the repository.
    ///
    /// Legacy entries are normalized on the way and written back only if
    /// something changed. Every mutation calls this first.
    pub async fn reload(&mut self) -> Result<(), MemoryError> {
        let stored = self.repo.load_facts(&self.username).await?;
        let migration = migrate_legacy(stored);
        if migration.changed {
            info!(
                username = %self.username,
                count = migration.records.len(),
                "migrated legacy memory entries"
            );
            self.persist(&migration.records, migration.last_serial).await?;
        }
        self.records = migration.records;
        self.last_serial = migration.last_serial;
        Ok(())
    }

    /// Normalize legacy entries: those without a serial get the next free one
    /// in their current position. Safe to call on every load.
    pub async fn migrate_legacy(&mut self) -> Result<(), MemoryError> {
        self.reload().await
    }

    /// The serial the next saved fact will receive.
    ///
    /// One past the highest serial ever assigned, so a deleted fact's serial
    /// never comes back.
    pub fn next_serial(&self) -> Serial {
        self.records
            .iter()
            .map(|r| r.serial)
            .chain(self.last_serial)
            .max()
            .map(Serial::next)
            .unwrap_or(Serial::FIRST)
    }

    /// Save a fact.
    ///
    /// `text` is trimmed; empty text and text equal (ignoring case) to a live
    /// fact are rejected without touching storage. An expiry already in the
    /// past is accepted and the fact disappears at the next sweep.
    pub async fn save(
        &mut self,
        text: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<SaveOutcome, MemoryError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SaveOutcome::EmptyText);
        }

        self.reload().await?;
        if self.list().any(|r| r.same_text(text)) {
            debug!(username = %self.username, text, "duplicate memory rejected");
            return Ok(SaveOutcome::Duplicate);
        }

        let serial = self.next_serial();
        let mut next = self.records.clone();
        next.push(FactRecord {
            serial,
            text: text.to_string(),
            expiry,
        });
        self.commit(next, Some(serial)).await?;

        debug!(username = %self.username, %serial, timed = expiry.is_some(), "memory saved");
        Ok(SaveOutcome::Saved(serial))
    }

    /// Delete live facts matching `selector`.
    ///
    /// Serial selectors match exactly one serial and are never retried as
    /// substrings. Substring selectors match case-insensitively against the
    /// fact text; an empty substring matches nothing. Returns the deleted
    /// facts, empty when nothing matched.
    pub async fn delete(
        &mut self,
        selector: &DeleteSelector,
    ) -> Result<Vec<FactRecord>, MemoryError> {
        self.reload().await?;
        let now = self.clock.now();
        let is_target = |record: &FactRecord| -> bool {
            if record.is_expired(now) {
                return false;
            }
            match selector {
                DeleteSelector::Serial(serial) => record.serial == *serial,
                DeleteSelector::Substring(needle) => {
                    let needle = needle.trim().to_lowercase();
                    !needle.is_empty() && record.text.to_lowercase().contains(&needle)
                }
            }
        };

        let (removed, kept): (Vec<FactRecord>, Vec<FactRecord>) =
            self.records.iter().cloned().partition(|r| is_target(r));

        if removed.is_empty() {
            debug!(username = %self.username, %selector, "no memory matched delete selector");
            return Ok(removed);
        }

        let last_serial = self.last_serial;
        self.commit(kept, last_serial).await?;
        debug!(
            username = %self.username,
            %selector,
            removed = removed.len(),
            "memories deleted"
        );
        Ok(removed)
    }

    /// Remove every fact whose expiry is at or before `now`.
    ///
    /// Persists only when something was removed. Returns the removed facts.
    pub async fn sweep(&mut self, now: DateTime<Utc>) -> Result<Vec<FactRecord>, MemoryError> {
        self.reload().await?;
        let (expired, kept): (Vec<FactRecord>, Vec<FactRecord>) = self
            .records
            .iter()
            .cloned()
            .partition(|r| r.is_expired(now));

        if expired.is_empty() {
            return Ok(expired);
        }

        let last_serial = self.last_serial;
        self.commit(kept, last_serial).await?;
        info!(
            username = %self.username,
            removed = expired.len(),
            "expired memories removed"
        );
        Ok(expired)
    }

    /// Live facts in insertion order, as of the last load or mutation.
    ///
    /// Facts past their expiry are never yielded, even before a sweep has
    /// removed them. The iterator borrows the store and can be requested again.
    pub fn list(&self) -> impl Iterator<Item = &FactRecord> + '_ {
        let now = self.clock.now();
        self.records.iter().filter(move |r| !r.is_expired(now))
    }

    /// Serials of all live facts, in insertion order.
    pub fn valid_serials(&self) -> Vec<Serial> {
        self.list().map(|r| r.serial).collect()
    }

    /// Number of live facts.
    pub fn len(&self) -> usize {
        self.list().count()
    }

    pub fn is_empty(&self) -> bool {
        self.list().next().is_none()
    }

    /// Persist `next` and adopt it as the current list.
    async fn commit(
        &mut self,
        next: Vec<FactRecord>,
        last_serial: Option<Serial>,
    ) -> Result<(), MemoryError> {
        self.persist(&next, last_serial).await?;
        self.records = next;
        self.last_serial = last_serial;
        Ok(())
    }

    async fn persist(
        &self,
        records: &[FactRecord],
        last_serial: Option<Serial>,
    ) -> Result<(), MemoryError> {
        self.repo
            .save_facts(&self.username, records, last_serial)
            .await
            .map_err(|e| {
                warn!(username = %self.username, error = %e, "failed to persist memory");
                MemoryError::Persistence(e)
            })
    }
}
