//! Memory types for Doppel.
//!
//! A user's memory is an ordered list of [`FactRecord`]s, each identified by a
//! per-user [`Serial`] ("SNo") that is never reused. [`StoredFact`] is the
//! on-disk shape, which may still contain legacy bare strings; it only exists
//! at the persistence boundary and is normalized on load.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;

/// Per-user serial number of a fact.
///
/// Serials increase in assignment order and are never handed out twice for
/// the same user, even after the fact they named was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serial(pub u64);

impl Serial {
    /// The serial assigned to the first fact of an empty store.
    pub const FIRST: Serial = Serial(1);

    /// The serial following this one.
    pub fn next(self) -> Serial {
        Serial(self.0.saturating_add(1))
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single remembered fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    #[serde(rename = "sno")]
    pub serial: Serial,
    /// Trimmed fact text.
    pub text: String,
    /// Absolute expiry; `None` means the fact is permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl FactRecord {
    /// Whether the fact must no longer be served at `now`.
    ///
    /// The boundary is inclusive: a fact expiring exactly at `now` is expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiry, Some(expiry) if expiry <= now)
    }

    /// Case-insensitive equality of fact text, ignoring surrounding whitespace.
    pub fn same_text(&self, other: &str) -> bool {
        self.text.trim().to_lowercase() == other.trim().to_lowercase()
    }

    /// Whether the fact permanently stays in memory.
    pub fn is_permanent(&self) -> bool {
        self.expiry.is_none()
    }
}

/// The persisted shape of a fact.
///
/// Older databases stored memories as bare strings, and some structured
/// entries were written before serials existed. Both are accepted here and
/// normalized into [`FactRecord`]s by the memory store's migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredFact {
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sno: Option<u64>,
        text: String,
        #[serde(
            default,
            deserialize_with = "deserialize_expiry",
            skip_serializing_if = "Option::is_none"
        )]
        expiry: Option<DateTime<Utc>>,
    },
    Legacy(String),
}

impl StoredFact {
    /// The fact text regardless of shape.
    pub fn text(&self) -> &str {
        match self {
            StoredFact::Record { text, .. } => text,
            StoredFact::Legacy(text) => text,
        }
    }

    /// The stored serial, if the entry has a usable one.
    ///
    /// A serial of zero is treated as missing.
    pub fn serial(&self) -> Option<Serial> {
        match self {
            StoredFact::Record { sno: Some(n), .. } if *n > 0 => Some(Serial(*n)),
            _ => None,
        }
    }
}

/// Everything persisted for one user's memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredMemory {
    /// Facts in insertion order, possibly still in a legacy shape.
    pub facts: Vec<StoredFact>,
    /// Highest serial ever assigned. Older databases do not record it.
    pub last_serial: Option<Serial>,
}

impl From<&FactRecord> for StoredFact {
    fn from(record: &FactRecord) -> Self {
        StoredFact::Record {
            sno: Some(record.serial.0),
            text: record.text.clone(),
            expiry: record.expiry,
        }
    }
}

/// Accepts RFC 3339 timestamps and legacy naive ISO timestamps (local time).
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    parse_expiry(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid expiry timestamp: '{raw}'")))
}

/// Parse a stored expiry timestamp.
///
/// Timestamps with an offset are taken as-is; naive ones are interpreted in
/// the local timezone.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// What a delete request targets.
///
/// A selector made only of decimal digits always targets a serial; it is
/// never used as a substring, even when no fact has that serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteSelector {
    Serial(Serial),
    Substring(String),
}

impl DeleteSelector {
    /// Classify a raw selector.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            // Serials too large for u64 can never be live, so they map to a
            // value no store will ever assign.
            let n = trimmed.parse::<u64>().unwrap_or(u64::MAX);
            DeleteSelector::Serial(Serial(n))
        } else {
            DeleteSelector::Substring(trimmed.to_string())
        }
    }
}

impl fmt::Display for DeleteSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteSelector::Serial(serial) => write!(f, "SNo {serial}"),
            DeleteSelector::Substring(s) => write!(f, "'{s}'"),
        }
    }
}

/// Result of saving a fact. Rejections are values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The fact was stored under this serial.
    Saved(Serial),
    /// A live fact with the same text (ignoring case) already exists.
    Duplicate,
    /// The text was empty after trimming.
    EmptyText,
}
