//! Configuration loader for Doppel.
//!
//! Reads `config.toml` from the data directory (`~/.doppel/` in production)
//! and deserializes it into [`DoppelConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use doppel_types::config::DoppelConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`DoppelConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - A zero `history_window` is raised to 1.
pub async fn load_config(data_dir: &Path) -> DoppelConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return DoppelConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return DoppelConfig::default();
        }
    };

    match toml::from_str::<DoppelConfig>(&content) {
        Ok(mut config) => {
            config.history_window = config.history_window.max(1);
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            DoppelConfig::default()
        }
    }
}
