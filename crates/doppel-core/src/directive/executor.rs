//! Applies parsed directives to a memory store.
//!
//! Directives run in the order they were written. A rejected directive
//! (duplicate, invalid time, empty text, nothing to delete) produces its
//! notice and processing moves on to the next one. A persistence failure
//! stops the batch and is returned to the caller. After the batch an expiry
//! sweep runs once more.

use chrono::{DateTime, Utc};
use tracing::debug;

use doppel_types::directive::{Directive, DirectiveOutcome, Lifetime};
use doppel_types::error::MemoryError;
use doppel_types::memory::{FactRecord, SaveOutcome};

use crate::clock::Clock;
use crate::memory::store::MemoryStore;
use crate::repository::fact::FactRepository;

/// Outcomes of one batch of directives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Execution {
    /// One outcome per directive, in order.
    pub outcomes: Vec<DirectiveOutcome>,
    /// Facts removed by the closing expiry sweep.
    pub expired: Vec<FactRecord>,
}

/// Stateless executor for memory directives.
pub struct DirectiveExecutor;

impl DirectiveExecutor {
    /// Apply every directive, then sweep expired facts.
    #[tracing::instrument(
        name = "execute_directives",
        skip(store, directives),
        fields(username = %store.username(), count = directives.len())
    )]
    pub async fn execute<R: FactRepository, C: Clock>(
        store: &mut MemoryStore<R, C>,
        directives: &[Directive],
    ) -> Result<Execution, MemoryError> {
        let mut outcomes = Vec::with_capacity(directives.len());
        for directive in directives {
            let outcome = Self::apply(store, directive).await?;
            debug!(accepted = outcome.is_accepted(), "{outcome}");
            outcomes.push(outcome);
        }

        let now = store.now();
        let expired = store.sweep(now).await?;
        Ok(Execution { outcomes, expired })
    }

    /// Apply a single directive.
    pub async fn apply<R: FactRepository, C: Clock>(
        store: &mut MemoryStore<R, C>,
        directive: &Directive,
    ) -> Result<DirectiveOutcome, MemoryError> {
        match directive {
            Directive::Save { text, lifetime } => Self::save(store, text, lifetime).await,
            Directive::Delete { selector } => {
                let removed = store.delete(selector).await?;
                Ok(if removed.is_empty() {
                    DirectiveOutcome::DeleteNoMatch {
                        selector: selector.clone(),
                    }
                } else {
                    DirectiveOutcome::Deleted {
                        selector: selector.clone(),
                        removed,
                    }
                })
            }
        }
    }

    async fn save<R: FactRepository, C: Clock>(
        store: &mut MemoryStore<R, C>,
        text: &str,
        lifetime: &Lifetime,
    ) -> Result<DirectiveOutcome, MemoryError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(DirectiveOutcome::EmptyTextRejected);
        }

        let (expiry, raw): (Option<DateTime<Utc>>, Option<&String>) = match lifetime {
            Lifetime::Permanent => (None, None),
            Lifetime::For { span, raw } => match store.now().checked_add_signed(*span) {
                Some(expiry) => (Some(expiry), Some(raw)),
                None => return Ok(invalid_time(text, raw)),
            },
            Lifetime::Invalid(raw) => return Ok(invalid_time(text, raw)),
        };

        let outcome = match store.save(text, expiry).await? {
            SaveOutcome::Saved(serial) => match (expiry, raw) {
                (Some(expires_at), Some(raw)) => DirectiveOutcome::SavedTimed {
                    serial,
                    text: text.to_string(),
                    expires_at,
                    raw: raw.clone(),
                },
                _ => DirectiveOutcome::SavedPermanent {
                    serial,
                    text: text.to_string(),
                },
            },
            SaveOutcome::Duplicate => DirectiveOutcome::DuplicateRejected {
                text: text.to_string(),
            },
            SaveOutcome::EmptyText => DirectiveOutcome::EmptyTextRejected,
        };
        Ok(outcome)
    }
}

fn invalid_time(text: &str, raw: &str) -> DirectiveOutcome {
    DirectiveOutcome::InvalidTimeRejected {
        text: text.to_string(),
        raw: raw.to_string(),
    }
}
