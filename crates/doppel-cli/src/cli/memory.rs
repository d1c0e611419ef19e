//! Memory management CLI commands: list, save, delete, sweep, remember.
//!
//! Every change goes through the directive executor, so the CLI reports the
//! same notices a chat turn would.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use doppel_core::context::format_fact;
use doppel_core::directive::executor::{DirectiveExecutor, Execution};
use doppel_core::directive::time::parse_time_string;
use doppel_core::directive::trigger::{TRIGGER_PREFIXES, parse_user_input};
use doppel_types::directive::{Directive, DirectiveOutcome, Lifetime};
use doppel_types::memory::{DeleteSelector, FactRecord};

use crate::state::AppState;

/// List live memories for a user.
///
/// # Examples
///
/// ```bash
/// doppel memory list dhairya
/// doppel memory list dhairya --json
/// ```
pub async fn list_memories(state: &AppState, username: &str, json: bool) -> Result<()> {
    let (profile, store) = state.open_memory(username).await?;
    let facts: Vec<&FactRecord> = store.list().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&facts)?);
        return Ok(());
    }

    if facts.is_empty() {
        println!();
        println!(
            "  {} No memories for '{}'.",
            style("i").blue().bold(),
            style(&profile.username).cyan(),
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Memories for '{}'", style(&profile.username).cyan().bold());
    println!();
    println!("{}", memory_table(&facts));
    println!();
    println!(
        "  {} memor{}",
        style(facts.len()).bold(),
        if facts.len() == 1 { "y" } else { "ies" }
    );
    println!();

    Ok(())
}

/// Save a memory, optionally with a timer.
///
/// # Examples
///
/// ```bash
/// doppel memory save dhairya "works night shifts"
/// doppel memory save dhairya "at the dentist" --for 2h
/// ```
pub async fn save_memory(
    state: &AppState,
    username: &str,
    text: &str,
    duration: Option<&str>,
    json: bool,
) -> Result<()> {
    let (_, mut store) = state.open_memory(username).await?;

    let lifetime = match duration.map(str::trim) {
        None => Lifetime::Permanent,
        Some(raw) => match parse_time_string(raw) {
            Ok(span) => Lifetime::For {
                span,
                raw: raw.to_string(),
            },
            Err(_) => Lifetime::Invalid(raw.to_string()),
        },
    };
    let directive = Directive::Save {
        text: text.to_string(),
        lifetime,
    };

    let execution = DirectiveExecutor::execute(&mut store, &[directive]).await?;
    print_execution(&execution, json)
}

/// Delete memories by SNo or text.
///
/// # Examples
///
/// ```bash
/// doppel memory delete dhairya 3
/// doppel memory delete dhairya dentist --force
/// ```
pub async fn delete_memory(
    state: &AppState,
    username: &str,
    selector: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let (_, mut store) = state.open_memory(username).await?;
    let selector = DeleteSelector::parse(selector);

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete memories matching {}?",
                style(&selector).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let execution = DirectiveExecutor::execute(&mut store, &[Directive::Delete { selector }]).await?;
    print_execution(&execution, json)
}

/// Remove expired memories now.
pub async fn sweep(state: &AppState, username: &str, json: bool) -> Result<()> {
    let (_, mut store) = state.open_memory(username).await?;
    let now = store.now();
    let expired = store.sweep(now).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"removed": expired, "remaining": store.len()})
        );
    } else if expired.is_empty() {
        println!("  {} Nothing has expired.", style("i").blue().bold());
    } else {
        print_expired(&expired);
    }
    Ok(())
}

/// Save a fact from a trigger phrase such as "remember that ...".
///
/// # Examples
///
/// ```bash
/// doppel remember dhairya remember that the gym closes at 10
/// doppel remember dhairya note that exams start monday /for 3d
/// ```
pub async fn remember(state: &AppState, username: &str, text: &str, json: bool) -> Result<()> {
    let Some(directive) = parse_user_input(text) else {
        bail!(
            "message must start with one of: {}",
            TRIGGER_PREFIXES.join(", ")
        );
    };
    let (_, mut store) = state.open_memory(username).await?;
    let execution = DirectiveExecutor::execute(&mut store, &[directive]).await?;
    print_execution(&execution, json)
}

// --- Formatting helpers ---

/// Table of facts with SNo, text and lifetime columns.
pub fn memory_table(facts: &[&FactRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("SNo").fg(Color::White),
        Cell::new("Memory").fg(Color::White),
        Cell::new("Expires").fg(Color::White),
    ]);

    for fact in facts {
        let expires = match fact.expiry {
            Some(expiry) => Cell::new(
                expiry
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            )
            .fg(Color::Yellow),
            None => Cell::new("permanent").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(fact.serial).fg(Color::Cyan),
            Cell::new(&fact.text).fg(Color::White),
            expires,
        ]);
    }
    table
}

/// Print directive outcomes and sweep results.
pub fn print_execution(execution: &Execution, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&execution_json(execution))?);
        return Ok(());
    }
    for outcome in &execution.outcomes {
        print_outcome(outcome);
    }
    if !execution.expired.is_empty() {
        print_expired(&execution.expired);
    }
    Ok(())
}

pub fn execution_json(execution: &Execution) -> serde_json::Value {
    let outcomes: Vec<serde_json::Value> = execution
        .outcomes
        .iter()
        .map(|o| serde_json::json!({"accepted": o.is_accepted(), "message": o.to_string()}))
        .collect();
    serde_json::json!({"outcomes": outcomes, "expired": execution.expired})
}

pub fn print_outcome(outcome: &DirectiveOutcome) {
    let marker = if outcome.is_accepted() {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };
    println!("  {marker} {outcome}");
}

pub fn print_expired(expired: &[FactRecord]) {
    for fact in expired {
        println!(
            "  {} Expired: {}",
            style("⌛").dim(),
            style(format_fact(fact)).dim()
        );
    }
}
