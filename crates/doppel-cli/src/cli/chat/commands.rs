//! Slash command parsing for the chat loop.
//!
//! `/owner`, `/user` and `/save_to_memory` lines are messages, not commands:
//! they go to the trigger grammar or the generator untouched.

use console::style;

/// Prefixes that look like commands but belong to the conversation.
const MESSAGE_PREFIXES: [&str; 3] = ["/owner", "/user", "/save_to_memory"];

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Show live memories.
    Memories,
    /// Delete memories by SNo or text; without a selector, show how.
    DeleteMemory(Option<String>),
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input is a message.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim().to_string())),
        None => (trimmed.to_lowercase(), None),
    };

    if MESSAGE_PREFIXES.contains(&cmd.as_str()) {
        return None;
    }

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/memories" | "/mem" => Some(ChatCommand::Memories),
        "/delete_memory" | "/forget" => Some(ChatCommand::DeleteMemory(
            arg.filter(|a| !a.is_empty()),
        )),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}                 Show this help message", style("/help").cyan());
    println!("  {}                Clear the screen", style("/clear").cyan());
    println!("  {}                 End the chat session", style("/exit").cyan());
    println!("  {}             Show stored memories", style("/memories").cyan());
    println!(
        "  {} Delete by SNo or text",
        style("/delete_memory <sel>").cyan()
    );
    println!();
    println!("  {}", style("Saving memories:").bold());
    println!();
    println!(
        "  {}",
        style("remember that ... | note that ... | always remember that ... | keep in mind that ...")
            .dim()
    );
    println!(
        "  {}",
        style("add /for 30s, 10m, 2h or 1d to make it temporary").dim()
    );
    println!();
    println!(
        "  {}",
        style("Start with /owner to talk to the assistant, /user to draft a reply in your style.").dim()
    );
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
