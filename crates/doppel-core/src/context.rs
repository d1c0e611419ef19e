//! Generator context assembly.
//!
//! Builds the system context handed to the reply generator from the user's
//! live memory, profile and recent chat history. Sections are wrapped in XML
//! tags and appear in priority order:
//!
//! ```text
//! <memory_priority>...</memory_priority>
//! <valid_snos>Valid SNos: 1, 3</valid_snos>
//! <memory>SNo 1: ... (permanent)</memory>
//! <style>{analysis or starting command}</style>
//! <instructions>{directive protocol}</instructions>
//! <time>Today is ...</time>
//! <recent_conversation>...</recent_conversation>
//! <current_message>...</current_message>
//! ```
//!
//! Only the serials listed in `<valid_snos>` are live. Any other serial the
//! generator sees in history has been deleted.

use chrono::{DateTime, Local, Utc};

use doppel_types::chat::ChatEntry;
use doppel_types::config::DoppelConfig;
use doppel_types::memory::FactRecord;
use doppel_types::user::UserProfile;

/// Instructions teaching the generator the directive protocol.
pub const OWNER_INSTRUCTIONS: &str = r#"The owner is the person whose talking style you are learning and mimicking.
The user is the person chatting with the owner.

If the user says "Remember that", "Note that", "Always remember that" or "Keep in mind that",
treat it as an instruction to save to memory. You may also decide on your own to save
anything important about the owner, their schedule, availability, preferences, habits or slang.
Normalize facts so they are clean and precise before saving.

To save a fact, output on its own line:
/save_to_memory <fact>
To save a temporary fact, add a timer: /save_to_memory <fact> /for 1h
Timers use s, m, h or d (seconds, minutes, hours, days), for example 30m or 2d.

To remove memories, output on its own line either:
/delete_from_memory <SNo or keyword>
or just the SNo number, for example 2, to delete memory SNo 2.

Every memory has a serial number (SNo) that is unique among the user's memories.
Prefer deleting by SNo. To edit a memory, delete it by SNo first, then save the new text.

If you USE any information from the memory section in your answer, start your response with
/used_memory
on its own line.

When the owner is speaking (messages starting with /owner or using the phrases above, or
"Explain"/"Describe"), answer formally and in English. When the message starts with /user,
the owner wants a reply for someone else: use the owner's learned tone.

Always prioritize the memory section over chat history. If they conflict, trust memory."#;

/// Marker phrases of AI history entries that only reported memory operations.
const MEMORY_CHATTER: [&str; 8] = [
    "/save_to_memory",
    "/delete_from_memory",
    "saved: sno",
    "saved permanent memory",
    "saved timed memory",
    "deleted memories:",
    "auto-saved",
    "auto-deleted",
];

/// AI entries shorter than this that mention a serial are treated as chatter.
const SHORT_SERIAL_MENTION: usize = 100;

/// Builds generator context from store state and history.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    history_window: usize,
    default_instruction: String,
}

impl ContextAssembler {
    pub fn new(history_window: usize, default_instruction: impl Into<String>) -> Self {
        Self {
            history_window,
            default_instruction: default_instruction.into(),
        }
    }

    pub fn from_config(config: &DoppelConfig) -> Self {
        Self::new(config.history_window, config.default_instruction.clone())
    }

    /// Build the full system context for one turn.
    ///
    /// `facts` must be the store's live facts, in list order.
    pub fn build<'a>(
        &self,
        profile: &UserProfile,
        facts: impl IntoIterator<Item = &'a FactRecord>,
        history: &[ChatEntry],
        user_message: &str,
        now: DateTime<Utc>,
    ) -> String {
        let facts: Vec<&FactRecord> = facts.into_iter().collect();
        let mut sections = Vec::with_capacity(8);

        sections.push(
            "<memory_priority>\n\
            You must prioritize information from <memory> over chat history.\n\
            If anything in <memory> conflicts with <recent_conversation>, trust <memory>.\n\
            </memory_priority>"
                .to_string(),
        );

        sections.push(format!(
            "<valid_snos>\n{}\n</valid_snos>",
            valid_serials_line(&facts)
        ));

        let memory = if facts.is_empty() {
            "(no additional learning yet)".to_string()
        } else {
            facts
                .iter()
                .map(|f| format_fact(f))
                .collect::<Vec<_>>()
                .join("\n")
        };
        sections.push(format!(
            "<memory>\n{memory}\n\nThis is the authoritative source of truth.\n</memory>"
        ));

        let style = profile
            .style_instruction()
            .unwrap_or(self.default_instruction.as_str());
        sections.push(format!("<style>\n{}\n</style>", style.trim()));

        sections.push(format!("<instructions>\n{OWNER_INSTRUCTIONS}\n</instructions>"));

        let local = now.with_timezone(&Local);
        sections.push(format!(
            "<time>\nToday is {}. Consider the current day and time while answering.\n</time>",
            local.format("%A, %B %d, %Y at %I:%M %p")
        ));

        sections.push(format!(
            "<recent_conversation>\n{}\n</recent_conversation>",
            self.recent_conversation(history)
        ));

        sections.push(format!(
            "<current_message>\n{}\n</current_message>",
            user_message.trim()
        ));

        sections.join("\n\n")
    }

    /// Render the last `history_window` entries, skipping memory chatter.
    fn recent_conversation(&self, history: &[ChatEntry]) -> String {
        let start = history.len().saturating_sub(self.history_window);
        let lines: Vec<String> = history[start..]
            .iter()
            .filter(|entry| !is_memory_chatter(entry))
            .map(|entry| format!("{}: {}", entry.sender, entry.text))
            .collect();

        if lines.is_empty() {
            "(No recent conversational messages)".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// `Valid SNos: 1, 3` or a note that memory is empty.
pub fn valid_serials_line(facts: &[&FactRecord]) -> String {
    if facts.is_empty() {
        return "No memories stored yet.".to_string();
    }
    let serials: Vec<String> = facts.iter().map(|f| f.serial.to_string()).collect();
    format!(
        "Valid SNos: {}\nOnly these SNos exist. Any other SNo mentioned in chat history has been deleted; ignore it completely.",
        serials.join(", ")
    )
}

/// `SNo 3: text (expires ...)` or `(permanent)`.
pub fn format_fact(fact: &FactRecord) -> String {
    match fact.expiry {
        Some(expiry) => format!(
            "SNo {}: {} (expires {})",
            fact.serial,
            fact.text,
            expiry.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => format!("SNo {}: {} (permanent)", fact.serial, fact.text),
    }
}

/// Whether an AI history entry only reported memory operations.
pub fn is_memory_chatter(entry: &ChatEntry) -> bool {
    if !entry.is_ai() {
        return false;
    }
    let lower = entry.text.to_lowercase();
    if MEMORY_CHATTER.iter().any(|marker| lower.contains(marker)) {
        return true;
    }
    entry.text.trim().len() < SHORT_SERIAL_MENTION && mentions_serial(&lower)
}

/// Whether lowercase `text` contains the word `sno` followed by whitespace and digits.
fn mentions_serial(text: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices("sno").any(|(idx, _)| {
        if text[..idx].chars().next_back().is_some_and(is_word) {
            return false;
        }
        let rest = &text[idx + 3..];
        let after_space = rest.trim_start();
        if after_space.len() == rest.len() {
            return false;
        }
        let digits = after_space
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after_space.len());
        digits > 0 && !after_space[digits..].chars().next().is_some_and(is_word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use doppel_types::memory::Serial;

    fn fact(serial: u64, text: &str) -> FactRecord {
        FactRecord {
            serial: Serial(serial),
            text: text.to_string(),
            expiry: None,
        }
    }

    fn ai(text: &str) -> ChatEntry {
        ChatEntry::from_ai(text, Utc::now())
    }

    #[test]
    fn test_valid_serials_are_disclosed() {
        let assembler = ContextAssembler::from_config(&DoppelConfig::default());
        let profile = UserProfile::new("dhairya", None);
        let facts = [fact(1, "likes tea"), fact(3, "works nights")];
        let context = assembler.build(&profile, &facts, &[], "hi", Utc::now());

        assert!(context.contains("Valid SNos: 1, 3"));
        assert!(context.contains("SNo 1: likes tea (permanent)"));
        assert!(context.contains("SNo 3: works nights (permanent)"));
        assert!(context.contains("<current_message>\nhi\n</current_message>"));
    }

    #[test]
    fn test_empty_memory_sections() {
        let assembler = ContextAssembler::new(40, "fallback");
        let profile = UserProfile::new("dhairya", None);
        let context = assembler.build(&profile, &[], &[], "hi", Utc::now());
        assert!(context.contains("No memories stored yet."));
        assert!(context.contains("(no additional learning yet)"));
        assert!(context.contains("(No recent conversational messages)"));
    }

    #[test]
    fn test_sections_in_priority_order() {
        let assembler = ContextAssembler::new(40, "fallback");
        let profile = UserProfile::new("dhairya", None);
        let context = assembler.build(&profile, &[], &[], "hi", Utc::now());
        let order = [
            "<memory_priority>",
            "<valid_snos>",
            "<memory>",
            "<style>",
            "<instructions>",
            "<time>",
            "<recent_conversation>",
            "<current_message>",
        ];
        let positions: Vec<usize> = order.iter().map(|t| context.find(t).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_timed_fact_shows_expiry() {
        let mut timed = fact(2, "at the dentist");
        timed.expiry = Some(Utc::now() + TimeDelta::hours(1));
        assert!(format_fact(&timed).starts_with("SNo 2: at the dentist (expires "));
    }

    #[test]
    fn test_history_window_and_chatter_filter() {
        let assembler = ContextAssembler::new(3, "fallback");
        let profile = UserProfile::new("dhairya", None);
        let now = Utc::now();
        let history = vec![
            ChatEntry::from_user("too old", now),
            ChatEntry::from_user("what's up", now),
            ai("Saved permanent memory: SNo 4: likes tea"),
            ai("sure, bro"),
        ];
        let context = assembler.build(&profile, &[], &history, "hi", now);
        assert!(!context.contains("too old"));
        assert!(context.contains("You: what's up"));
        assert!(!context.contains("likes tea"));
        assert!(context.contains("AI: sure, bro"));
    }

    #[test]
    fn test_memory_chatter_detection() {
        assert!(is_memory_chatter(&ai("Done, removed SNo 12.")));
        assert!(is_memory_chatter(&ai("/delete_from_memory gym")));
        assert!(!is_memory_chatter(&ai("snow 12 inches today")));
        assert!(!is_memory_chatter(&ai("the isno 3 thing")));
        assert!(!is_memory_chatter(&ChatEntry::from_user("delete SNo 3", Utc::now())));

        let long = format!("SNo 3 was about your gym. {}", "x".repeat(120));
        assert!(!is_memory_chatter(&ai(&long)));
    }

    #[test]
    fn test_style_falls_back_to_default() {
        let assembler = ContextAssembler::new(40, "fallback style");
        let mut profile = UserProfile::new("dhairya", None);
        profile.starting_command = String::new();
        let context = assembler.build(&profile, &[], &[], "hi", Utc::now());
        assert!(context.contains("<style>\nfallback style\n</style>"));
    }
}
