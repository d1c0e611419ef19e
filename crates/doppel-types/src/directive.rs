//! Memory directive types.
//!
//! A [`Directive`] is a mutation request extracted from free-form text, either
//! from the generator's reply or from the user's own input. Executing one
//! yields a [`DirectiveOutcome`], which always renders to a specific
//! human-readable notice.

use chrono::{DateTime, TimeDelta, Utc};

use std::fmt;

use crate::memory::{DeleteSelector, FactRecord, Serial};

/// How long a saved fact should live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifetime {
    /// No `/for` suffix was given.
    Permanent,
    /// A valid `/for <time_str>` suffix.
    For { span: TimeDelta, raw: String },
    /// A `/for` suffix whose time string does not match the grammar.
    Invalid(String),
}

/// A structured mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Save { text: String, lifetime: Lifetime },
    Delete { selector: DeleteSelector },
}

/// The result of applying one directive to a memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveOutcome {
    SavedPermanent {
        serial: Serial,
        text: String,
    },
    SavedTimed {
        serial: Serial,
        text: String,
        expires_at: DateTime<Utc>,
        raw: String,
    },
    DuplicateRejected {
        text: String,
    },
    InvalidTimeRejected {
        text: String,
        raw: String,
    },
    EmptyTextRejected,
    Deleted {
        selector: DeleteSelector,
        removed: Vec<FactRecord>,
    },
    DeleteNoMatch {
        selector: DeleteSelector,
    },
}

impl DirectiveOutcome {
    /// Whether the directive changed the store.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            DirectiveOutcome::SavedPermanent { .. }
                | DirectiveOutcome::SavedTimed { .. }
                | DirectiveOutcome::Deleted { .. }
        )
    }
}

impl fmt::Display for DirectiveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveOutcome::SavedPermanent { serial, text } => {
                write!(f, "Saved permanent memory: SNo {serial}: {text}")
            }
            DirectiveOutcome::SavedTimed {
                serial, text, raw, ..
            } => write!(f, "Saved timed memory: SNo {serial}: {text} (expires in {raw})"),
            DirectiveOutcome::DuplicateRejected { text } => {
                write!(f, "Memory already exists: {text}")
            }
            DirectiveOutcome::InvalidTimeRejected { text, raw } => write!(
                f,
                "Invalid time format '{raw}' for memory '{text}'. Use like '1h', '30m', '2d'."
            ),
            DirectiveOutcome::EmptyTextRejected => write!(f, "Memory text cannot be empty"),
            DirectiveOutcome::Deleted { removed, .. } => {
                let items: Vec<String> = removed
                    .iter()
                    .map(|r| format!("SNo {} -> {}", r.serial, r.text))
                    .collect();
                write!(f, "Deleted memories: {}", items.join(", "))
            }
            DirectiveOutcome::DeleteNoMatch { selector } => match selector {
                DeleteSelector::Serial(serial) => {
                    write!(f, "No memory with SNo {serial} exists")
                }
                DeleteSelector::Substring(s) => write!(f, "No matching memory found for '{s}'"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages_are_distinguishable() {
        let outcomes = [
            DirectiveOutcome::SavedPermanent {
                serial: Serial(1),
                text: "a".to_string(),
            },
            DirectiveOutcome::SavedTimed {
                serial: Serial(2),
                text: "a".to_string(),
                expires_at: Utc::now(),
                raw: "1h".to_string(),
            },
            DirectiveOutcome::DuplicateRejected {
                text: "a".to_string(),
            },
            DirectiveOutcome::InvalidTimeRejected {
                text: "a".to_string(),
                raw: "soon".to_string(),
            },
            DirectiveOutcome::EmptyTextRejected,
            DirectiveOutcome::Deleted {
                selector: DeleteSelector::Serial(Serial(1)),
                removed: vec![],
            },
            DirectiveOutcome::DeleteNoMatch {
                selector: DeleteSelector::Serial(Serial(1)),
            },
        ];
        let messages: Vec<String> = outcomes.iter().map(|o| o.to_string()).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_saved_messages_reference_serial() {
        let saved = DirectiveOutcome::SavedTimed {
            serial: Serial(12),
            text: "likes coffee".to_string(),
            expires_at: Utc::now(),
            raw: "1h".to_string(),
        };
        assert_eq!(
            saved.to_string(),
            "Saved timed memory: SNo 12: likes coffee (expires in 1h)"
        );
        assert!(saved.is_accepted());
    }

    #[test]
    fn test_deleted_message_lists_serials() {
        let deleted = DirectiveOutcome::Deleted {
            selector: DeleteSelector::Substring("gym".to_string()),
            removed: vec![
                FactRecord {
                    serial: Serial(1),
                    text: "gym at 6".to_string(),
                    expiry: None,
                },
                FactRecord {
                    serial: Serial(2),
                    text: "gym at 7".to_string(),
                    expiry: None,
                },
            ],
        };
        assert_eq!(
            deleted.to_string(),
            "Deleted memories: SNo 1 -> gym at 6, SNo 2 -> gym at 7"
        );
    }

    #[test]
    fn test_rejections_are_not_accepted() {
        assert!(!DirectiveOutcome::EmptyTextRejected.is_accepted());
        assert!(
            !DirectiveOutcome::DeleteNoMatch {
                selector: DeleteSelector::Substring("x".to_string())
            }
            .is_accepted()
        );
    }
}
