//! Reply generator backed by an external program.
//!
//! The configured command is spawned once per turn. It receives the
//! assembled context on stdin, the model name in `DOPPEL_MODEL`, and must
//! print the reply on stdout. A non-zero exit status fails the turn.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use doppel_core::generator::Generator;
use doppel_types::config::DoppelConfig;
use doppel_types::error::GeneratorError;

/// Environment variable carrying the configured model name.
pub const MODEL_ENV: &str = "DOPPEL_MODEL";

/// Environment variable carrying the raw user message.
pub const USER_MESSAGE_ENV: &str = "DOPPEL_USER_MESSAGE";

/// Runs an external command to produce replies.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    model: String,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            model: model.into(),
        }
    }

    /// Build from `generator_command`, or `None` when it is unset or empty.
    pub fn from_config(config: &DoppelConfig) -> Option<Self> {
        let (program, args) = config.generator_command.as_deref()?.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), config.model.clone()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Generator for CommandGenerator {
    async fn generate(&self, system: &str, user_message: &str) -> Result<String, GeneratorError> {
        debug!(program = %self.program, model = %self.model, "spawning generator");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(MODEL_ENV, &self.model)
            .env(USER_MESSAGE_ENV, user_message)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GeneratorError::Unavailable(format!("{}: {e}", self.program)))?;

        // Feed stdin while stdout is drained; a generator that echoes as it
        // reads would otherwise fill its output pipe and block both sides.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A generator that exits without reading its input is not an
                // error here; its exit status decides.
                if let Err(e) = stdin.write_all(system.as_bytes()).await {
                    debug!(error = %e, "generator closed stdin early");
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| GeneratorError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, "generator exited with failure");
            return Err(GeneratorError::Failed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandGenerator {
        CommandGenerator::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
            "test-model",
        )
    }

    #[test]
    fn test_from_config() {
        let mut config = DoppelConfig::default();
        assert!(CommandGenerator::from_config(&config).is_none());
        config.generator_command = Some(Vec::new());
        assert!(CommandGenerator::from_config(&config).is_none());
        config.generator_command = Some(vec!["llm".to_string(), "-q".to_string()]);
        let generator = CommandGenerator::from_config(&config).unwrap();
        assert_eq!(generator.program(), "llm");
        assert_eq!(generator.args, vec!["-q"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reply_from_stdout() {
        let generator = sh("cat >/dev/null; echo \"$DOPPEL_MODEL\"; echo '/save_to_memory x'");
        let reply = generator.generate("context", "hi").await.unwrap();
        assert_eq!(reply, "test-model\n/save_to_memory x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_context_is_piped_to_stdin() {
        let generator = sh("cat");
        let reply = generator.generate("<memory>\nSNo 1\n</memory>", "hi").await.unwrap();
        assert_eq!(reply, "<memory>\nSNo 1\n</memory>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_context_does_not_block_on_full_pipes() {
        let context = "x".repeat(2 * 1024 * 1024);
        let generator = sh("cat");
        let reply = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            generator.generate(&context, "hi"),
        )
        .await
        .expect("generator stalled on a large context")
        .unwrap();
        assert_eq!(reply.len(), context.len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_status_is_error() {
        let generator = sh("echo 'quota exceeded' >&2; exit 3");
        let err = generator.generate("context", "hi").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Failed(msg) if msg == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let generator = CommandGenerator::new("doppel-no-such-generator", Vec::new(), "m");
        let err = generator.generate("context", "hi").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Unavailable(_)));
    }
}
