//! Generator trait definition.
//!
//! The generator is whatever produces the assistant's reply text. It is an
//! untrusted producer: its output is parsed for memory directives and never
//! applied verbatim. Implementations live in doppel-infra.

use doppel_types::error::GeneratorError;

/// Produces a reply for one turn.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Generator: Send + Sync {
    /// Generate a reply from the assembled system context and the raw user message.
    fn generate(
        &self,
        system: &str,
        user_message: &str,
    ) -> impl std::future::Future<Output = Result<String, GeneratorError>> + Send;
}
