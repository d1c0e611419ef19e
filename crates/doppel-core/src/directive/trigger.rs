//! Save triggers in the user's own input.
//!
//! A message starting with one of [`TRIGGER_PREFIXES`] (case-insensitive) is
//! a request to remember the rest of the message. Prefixes are tried in the
//! listed order and the first match decides where the fact begins. The rest
//! follows the same `/for <time_str>` rule as generator save directives.

use doppel_types::directive::Directive;

use super::parser::parse_save_payload;

/// Prefixes that turn user input into a save request, in match order.
pub const TRIGGER_PREFIXES: [&str; 6] = [
    "remember that",
    "note that",
    "always remember that",
    "keep in mind that",
    "/owner remember",
    "/save_to_memory",
];

/// Parse user input into a save directive, if it starts with a trigger.
pub fn parse_user_input(input: &str) -> Option<Directive> {
    let trimmed = input.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let prefix = TRIGGER_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))?;
    Some(parse_save_payload(&trimmed[prefix.len()..]))
}
