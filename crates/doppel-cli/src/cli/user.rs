//! User account CLI commands: create, list, show, delete, set-analysis.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Input;
use tokio::io::AsyncReadExt;

use doppel_core::repository::fact::FactRepository;
use doppel_core::repository::history::HistoryRepository;

use crate::state::AppState;

/// Create a user account.
///
/// # Examples
///
/// ```bash
/// doppel user create dhairya
/// doppel user create dhairya --starting-command "Reply like me: short, lowercase, lots of 'bro'"
/// ```
pub async fn create_user(
    state: &AppState,
    name: &str,
    starting_command: Option<String>,
    json: bool,
) -> Result<()> {
    let profile = state.accounts.create(name, starting_command).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!();
        println!(
            "  {} Created user '{}'",
            style("✓").green().bold(),
            style(&profile.username).cyan().bold()
        );
        println!("  {}", style(&profile.starting_command).dim());
        println!();
        println!(
            "  {}",
            style(format!("Start chatting: doppel chat {}", profile.username)).dim()
        );
        println!();
    }
    Ok(())
}

/// List user accounts with their memory counts.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let names = state.accounts.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!();
        println!(
            "  {} No users yet. Create one with: {}",
            style("i").blue().bold(),
            style("doppel user create <name>").cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("User").fg(Color::White),
        Cell::new("Stored memories").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for name in &names {
        let profile = state.accounts.get(name).await?;
        let stored = state.users.load_facts(name).await.map(|m| m.facts.len()).unwrap_or(0);
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(stored).fg(Color::Yellow),
            Cell::new(profile.created_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Show a user's profile.
pub async fn show_user(state: &AppState, name: &str, json: bool) -> Result<()> {
    let (profile, store) = state.open_memory(name).await?;
    let history = state.history.load_history(&profile.username).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "profile": profile,
                "memories": store.len(),
                "valid_snos": store.valid_serials(),
                "history_messages": history.len(),
            }))?
        );
        return Ok(());
    }

    println!();
    println!("  {}", style(&profile.username).cyan().bold());
    println!();
    println!("  {}", style("── Details ──").dim());
    println!(
        "  {}          {}",
        style("Created:").bold(),
        profile.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {} {}",
        style("Starting command:").bold(),
        profile.starting_command
    );
    println!(
        "  {}         {}",
        style("Memories:").bold(),
        store.len()
    );
    println!(
        "  {}          {} messages",
        style("History:").bold(),
        history.len()
    );
    println!();
    println!("  {}", style("── Style analysis ──").dim());
    match &profile.analysis {
        Some(analysis) if !analysis.trim().is_empty() => {
            for line in analysis.lines() {
                println!("  {line}");
            }
            if let Some(at) = profile.analysis_generated_at {
                println!();
                println!(
                    "  {}",
                    style(format!("generated {}", at.format("%Y-%m-%d %H:%M UTC"))).dim()
                );
            }
        }
        _ => println!("  {}", style("(none)").dim()),
    }
    println!();
    Ok(())
}

/// Delete a user after a typed confirmation.
///
/// # Examples
///
/// ```bash
/// doppel user delete dhairya
/// doppel user delete dhairya --force
/// ```
pub async fn delete_user(state: &AppState, name: &str, force: bool, json: bool) -> Result<()> {
    let profile = state.accounts.get(name).await?;

    if !force && !json {
        println!(
            "  {} This permanently deletes '{}' with all memories and chat history.",
            style("!").red().bold(),
            style(&profile.username).red().bold()
        );
        let typed: String = Input::new()
            .with_prompt("Type the username to confirm")
            .allow_empty(true)
            .interact_text()?;

        if typed.trim() != profile.username {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.accounts.delete(&profile.username).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "username": profile.username})
        );
    } else {
        println!(
            "  {} User '{}' deleted.",
            style("✓").red().bold(),
            profile.username
        );
    }
    Ok(())
}

/// Record a style analysis read from a file or stdin.
pub async fn set_analysis(
    state: &AppState,
    name: &str,
    file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let analysis = read_input(file).await?;
    if analysis.trim().is_empty() {
        bail!("analysis text is empty");
    }
    let profile = state.accounts.set_analysis(name, &analysis).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "  {} Style analysis saved for '{}'.",
            style("✓").green().bold(),
            style(&profile.username).cyan()
        );
    }
    Ok(())
}

/// Read a whole file, or stdin when no path is given.
pub async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
