//! Chat history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender label for messages typed by the user.
pub const SENDER_USER: &str = "You";

/// Sender label for assistant replies.
pub const SENDER_AI: &str = "AI";

/// One message in a user's chat history.
///
/// Imported chat exports carry arbitrary sender names; extra fields such as
/// attachments are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatEntry {
    /// A message sent by the user now.
    pub fn from_user(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(SENDER_USER, text, at)
    }

    /// A reply from the assistant now.
    pub fn from_ai(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(SENDER_AI, text, at)
    }

    fn new(sender: &str, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: sender.to_string(),
            text: text.into(),
            timestamp: Some(at.to_rfc3339()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.sender == SENDER_AI
    }
}
