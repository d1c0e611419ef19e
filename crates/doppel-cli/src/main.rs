//! Doppel CLI entry point.
//!
//! Binary name: `doppel`
//!
//! Parses CLI arguments, sets up tracing, wires the JSON stores, then
//! dispatches to the matching command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, MemoryCommand, UserCommand};
use doppel_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "doppel", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(&state, cli).await;

    shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::User { action } => match action {
            UserCommand::Create {
                name,
                starting_command,
            } => cli::user::create_user(state, &name, starting_command, json).await,
            UserCommand::List => cli::user::list_users(state, json).await,
            UserCommand::Show { name } => cli::user::show_user(state, &name, json).await,
            UserCommand::Delete { name, force } => {
                cli::user::delete_user(state, &name, force, json).await
            }
            UserCommand::SetAnalysis { name, file } => {
                cli::user::set_analysis(state, &name, file.as_deref(), json).await
            }
        },

        Commands::Memory { action } => match action {
            MemoryCommand::List { username } => {
                cli::memory::list_memories(state, &username, json).await
            }
            MemoryCommand::Save {
                username,
                text,
                duration,
            } => cli::memory::save_memory(state, &username, &text, duration.as_deref(), json).await,
            MemoryCommand::Delete {
                username,
                selector,
                force,
            } => cli::memory::delete_memory(state, &username, &selector, force, json).await,
            MemoryCommand::Sweep { username } => cli::memory::sweep(state, &username, json).await,
        },

        Commands::Remember { username, text } => {
            cli::memory::remember(state, &username, &text.join(" "), json).await
        }

        Commands::Apply { username, file } => {
            cli::apply::apply_reply(state, &username, file.as_deref(), json).await
        }

        Commands::Chat { username } => cli::chat::loop_runner::run_chat_loop(state, &username).await,

        // Handled before state init
        Commands::Completions { .. } => Ok(()),
    }
}
