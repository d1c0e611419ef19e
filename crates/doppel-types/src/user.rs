//! User profile types.
//!
//! A profile is the metadata stored next to a user's memory: when the account
//! was created, the instruction given at signup, and the style analysis the
//! assistant mimics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Starting command used when none is given at signup.
pub const DEFAULT_STARTING_COMMAND: &str =
    "Analyze my chat style, tone, language, and reply patterns.";

/// Metadata of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub starting_command: String,
    /// Style analysis text produced from imported chats.
    pub analysis: Option<String>,
    pub analysis_generated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Create a profile for a new account.
    pub fn new(username: impl Into<String>, starting_command: Option<String>) -> Self {
        let starting_command = starting_command
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STARTING_COMMAND.to_string());
        Self {
            username: username.into(),
            created_at: Utc::now(),
            starting_command,
            analysis: None,
            analysis_generated_at: None,
        }
    }

    /// The instruction describing how to mimic this user.
    ///
    /// Prefers the style analysis, then the starting command.
    pub fn style_instruction(&self) -> Option<&str> {
        self.analysis
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .or(Some(self.starting_command.as_str()).filter(|s| !s.trim().is_empty()))
    }
}

/// Keep only characters safe for a file name, falling back to the raw name.
pub fn safe_username(username: &str) -> String {
    let safe: String = username
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe.trim().is_empty() {
        username.to_string()
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_uses_default_starting_command() {
        let profile = UserProfile::new("dhairya", None);
        assert_eq!(profile.starting_command, DEFAULT_STARTING_COMMAND);
        let profile = UserProfile::new("dhairya", Some("   ".to_string()));
        assert_eq!(profile.starting_command, DEFAULT_STARTING_COMMAND);
    }

    #[test]
    fn test_style_instruction_prefers_analysis() {
        let mut profile = UserProfile::new("dhairya", Some("be casual".to_string()));
        assert_eq!(profile.style_instruction(), Some("be casual"));
        profile.analysis = Some("uses lots of emojis".to_string());
        assert_eq!(profile.style_instruction(), Some("uses lots of emojis"));
    }

    #[test]
    fn test_safe_username() {
        assert_eq!(safe_username("john.doe!"), "johndoe");
        assert_eq!(safe_username("a_b-c"), "a_b-c");
        assert_eq!(safe_username("..."), "...");
    }
}
