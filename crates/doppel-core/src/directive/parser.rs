//! Line-oriented directive tokenizer for generator output.
//!
//! Every line of a reply is classified into exactly one [`LineToken`]; the
//! first rule that matches wins:
//!
//! | Line | Token |
//! |---|---|
//! | equals `/used_memory` (trimmed) | [`LineToken::MemoryReferenced`] |
//! | contains `/save_to_memory` | [`LineToken::Save`] |
//! | contains `/delete_from_memory` | [`LineToken::Delete`] |
//! | only decimal digits (trimmed) | [`LineToken::SerialDelete`] |
//! | anything else | [`LineToken::Text`] |
//!
//! Keywords match case-insensitively. Every token except `Text` is removed
//! from the text shown to the user.

use doppel_types::directive::{Directive, Lifetime};
use doppel_types::memory::DeleteSelector;

use super::time::parse_time_string;

pub const USED_MEMORY: &str = "/used_memory";
pub const SAVE_KEYWORD: &str = "/save_to_memory";
pub const DELETE_KEYWORD: &str = "/delete_from_memory";
pub const FOR_KEYWORD: &str = "/for";

/// Classification of a single line of generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    MemoryReferenced,
    /// Everything after `/save_to_memory`.
    Save(&'a str),
    /// Everything after `/delete_from_memory`.
    Delete(&'a str),
    /// A line holding only a serial number.
    SerialDelete(&'a str),
    Text(&'a str),
}

impl LineToken<'_> {
    pub fn is_directive(&self) -> bool {
        !matches!(self, LineToken::Text(_))
    }
}

/// Result of tokenizing one reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    /// The reply with every directive line removed.
    pub display: String,
    /// Directives in the order they appeared.
    pub directives: Vec<Directive>,
    /// Whether the generator flagged that it drew on stored memory.
    pub memory_referenced: bool,
}

/// Classify one line.
pub fn classify_line(line: &str) -> LineToken<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case(USED_MEMORY) {
        return LineToken::MemoryReferenced;
    }
    if let Some(payload) = after_keyword(line, SAVE_KEYWORD) {
        return LineToken::Save(payload);
    }
    if let Some(payload) = after_keyword(line, DELETE_KEYWORD) {
        return LineToken::Delete(payload);
    }
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return LineToken::SerialDelete(trimmed);
    }
    LineToken::Text(line)
}

/// Tokenize a generator reply into directives and displayable text.
///
/// Text without any directive line comes back unchanged. Otherwise the
/// remaining lines are rejoined with `\n` and trimmed.
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut reply = ParsedReply::default();
    let mut kept = Vec::new();
    let mut stripped = false;

    for line in text.lines() {
        let token = classify_line(line);
        stripped |= token.is_directive();
        match token {
            LineToken::MemoryReferenced => reply.memory_referenced = true,
            LineToken::Save(payload) => reply.directives.push(parse_save_payload(payload)),
            LineToken::Delete(payload) => reply.directives.push(Directive::Delete {
                selector: DeleteSelector::parse(payload),
            }),
            LineToken::SerialDelete(digits) => reply.directives.push(Directive::Delete {
                selector: DeleteSelector::parse(digits),
            }),
            LineToken::Text(line) => kept.push(line),
        }
    }

    reply.display = if stripped {
        kept.join("\n").trim().to_string()
    } else {
        text.to_string()
    };
    reply
}

/// Build a save directive from the text following a save keyword.
///
/// `fact /for 2h` yields a timed save; a `/for` suffix that is not a valid
/// time string yields [`Lifetime::Invalid`] so the save can be rejected with
/// its own notice.
pub fn parse_save_payload(payload: &str) -> Directive {
    match split_keyword(payload, FOR_KEYWORD) {
        Some((fact, time_str)) => {
            let raw = time_str.trim().to_string();
            let lifetime = match parse_time_string(&raw) {
                Ok(span) => Lifetime::For { span, raw },
                Err(_) => Lifetime::Invalid(raw),
            };
            Directive::Save {
                text: fact.trim().to_string(),
                lifetime,
            }
        }
        None => Directive::Save {
            text: payload.trim().to_string(),
            lifetime: Lifetime::Permanent,
        },
    }
}

/// The remainder of `line` after the first case-insensitive `keyword`.
fn after_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    split_keyword(line, keyword).map(|(_, rest)| rest)
}

/// Split around the first case-insensitive occurrence of an ASCII keyword.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    // ASCII lowercasing keeps byte offsets identical to `text`.
    let idx = text.to_ascii_lowercase().find(keyword)?;
    Some((&text[..idx], &text[idx + keyword.len()..]))
}
