//! Global configuration types for Doppel.
//!
//! `DoppelConfig` represents the top-level `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoppelConfig {
    /// How many recent chat messages are shown to the generator.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// External program producing replies: program followed by its arguments.
    /// It receives the assembled context on stdin and prints the reply.
    #[serde(default)]
    pub generator_command: Option<Vec<String>>,

    /// Model label handed to the generator via `DOPPEL_MODEL`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Style instruction used when a user has neither analysis nor starting command.
    #[serde(default = "default_instruction")]
    pub default_instruction: String,
}

fn default_history_window() -> usize {
    40
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_instruction() -> String {
    "Mimic the user's style as best as possible.".to_string()
}

impl Default for DoppelConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            generator_command: None,
            model: default_model(),
            default_instruction: default_instruction(),
        }
    }
}
