//! Main chat loop orchestration.
//!
//! Opens the user's memory and history, then reads input until EOF. Each
//! line is either a slash command, a trigger-phrase save, or a message that
//! runs a full turn through the generator.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use doppel_core::chat::turn::{TurnProcessor, TurnReport};
use doppel_core::context::ContextAssembler;
use doppel_core::directive::executor::DirectiveExecutor;
use doppel_infra::generator::CommandGenerator;
use doppel_types::directive::Directive;
use doppel_types::memory::{DeleteSelector, FactRecord};

use crate::cli::memory::{memory_table, print_expired, print_outcome};
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop for a user.
pub async fn run_chat_loop(state: &AppState, username: &str) -> Result<()> {
    let generator = CommandGenerator::from_config(&state.config).with_context(|| {
        format!(
            "no generator configured; set generator_command in {}",
            state.data_dir.join("config.toml").display()
        )
    })?;

    let (profile, store) = state.open_memory(username).await?;
    let mut processor = TurnProcessor::open(
        store,
        state.history.clone(),
        generator,
        profile,
        ContextAssembler::from_config(&state.config),
    )
    .await?;

    print_welcome_banner(
        &processor.profile().username,
        &state.config.model,
        processor.store().len(),
        processor.history().len(),
    );

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Session ended.").dim());
                    break;
                }
                ChatCommand::Memories => {
                    if let Err(e) = processor.store_mut().reload().await {
                        println!("\n  {} Failed to load memory: {e}\n", style("!").red().bold());
                        continue;
                    }
                    let facts: Vec<&FactRecord> = processor.store().list().collect();
                    println!();
                    if facts.is_empty() {
                        println!("  {} No memories yet.", style("i").blue().bold());
                    } else {
                        println!("{}", memory_table(&facts));
                    }
                    println!();
                }
                ChatCommand::DeleteMemory(None) => {
                    println!(
                        "\n  {} Usage: /delete_memory <SNo or text>. Use /memories to see SNos.\n",
                        style("?").yellow().bold()
                    );
                }
                ChatCommand::DeleteMemory(Some(raw)) => {
                    let directive = Directive::Delete {
                        selector: DeleteSelector::parse(&raw),
                    };
                    println!();
                    match DirectiveExecutor::execute(processor.store_mut(), &[directive]).await {
                        Ok(execution) => {
                            execution.outcomes.iter().for_each(print_outcome);
                            print_expired(&execution.expired);
                        }
                        Err(e) => {
                            println!("  {} Failed to update memory: {e}", style("!").red().bold())
                        }
                    }
                    println!();
                }
                ChatCommand::Unknown(name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(name).dim()
                    );
                }
            }
            continue;
        }

        match processor.remember(&text).await {
            Ok(Some(outcome)) => {
                println!();
                print_outcome(&outcome);
                println!();
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                println!("\n  {} Failed to update memory: {e}\n", style("!").red().bold());
                continue;
            }
        }

        let spinner = thinking_spinner();
        let result = processor.process(&text).await;
        spinner.finish_and_clear();

        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                warn!(error = %e, "turn failed");
                eprintln!("\n  {} {e}", style("!").red().bold());
                eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
            }
        }
    }

    chat_input.flush();
    Ok(())
}

fn print_report(report: &TurnReport) {
    println!();
    let mut lines = report.display.lines();
    match lines.next() {
        Some(first) => {
            println!("  {} {first}", style("AI >").cyan().bold());
            for line in lines {
                println!("       {line}");
            }
        }
        None if report.outcomes.is_empty() => {
            println!("  {} {}", style("AI >").cyan().bold(), style("(no reply)").dim());
        }
        None => {}
    }
    if report.memory_referenced {
        println!("  {}", style("(drew on stored memory)").dim());
    }
    if !report.outcomes.is_empty() || !report.expired.is_empty() {
        println!();
        report.outcomes.iter().for_each(print_outcome);
        print_expired(&report.expired);
    }
    println!();
}
