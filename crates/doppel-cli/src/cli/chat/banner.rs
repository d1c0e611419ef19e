//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(username: &str, model: &str, memories: usize, history: usize) {
    println!();
    println!("  {} {}", style("◆").cyan(), style(username).cyan().bold());
    println!();
    println!("  {}     {}", style("Model:").bold(), style(model).dim());
    println!(
        "  {}  {}",
        style("Memories:").bold(),
        style(format!("{memories} stored")).dim()
    );
    println!(
        "  {}   {}",
        style("History:").bold(),
        style(format!("{history} messages")).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
