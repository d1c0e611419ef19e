//! Legacy memory migration.
//!
//! Older databases stored facts as bare strings or as objects without a
//! serial. Migration turns every stored entry into a [`FactRecord`], keeping
//! the entry's position and assigning fresh serials after the highest one
//! ever used. Running it on already-migrated data changes nothing.

use std::collections::HashSet;

use doppel_types::memory::{FactRecord, Serial, StoredFact, StoredMemory};

/// Result of normalizing stored facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub records: Vec<FactRecord>,
    /// Highest serial ever assigned, including serials of deleted facts.
    pub last_serial: Option<Serial>,
    /// True when any entry had to be rewritten and the store should be persisted.
    pub changed: bool,
}

/// Normalize stored facts into records with unique serials.
pub fn migrate_legacy(stored: StoredMemory) -> Migration {
    let StoredMemory { facts, last_serial } = stored;
    let mut last = facts
        .iter()
        .filter_map(StoredFact::serial)
        .chain(last_serial)
        .max();

    let mut seen = HashSet::with_capacity(facts.len());
    let mut changed = false;
    let mut records = Vec::with_capacity(facts.len());

    for fact in facts {
        let serial = match fact.serial() {
            Some(serial) if seen.insert(serial) => serial,
            _ => {
                // Missing or repeated serial: take the next free one.
                let assigned = last.map(Serial::next).unwrap_or(Serial::FIRST);
                last = Some(assigned);
                seen.insert(assigned);
                changed = true;
                assigned
            }
        };

        let (text, expiry) = match fact {
            StoredFact::Record { text, expiry, .. } => (text, expiry),
            StoredFact::Legacy(text) => {
                changed = true;
                (text, None)
            }
        };

        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            changed = true;
        }

        records.push(FactRecord {
            serial,
            text: trimmed.to_string(),
            expiry,
        });
    }

    Migration {
        records,
        last_serial: last,
        changed,
    }
}
