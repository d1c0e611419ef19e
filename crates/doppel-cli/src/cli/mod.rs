//! CLI command definitions and dispatch for the `doppel` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by the
//! resource they act on (`doppel user create`, `doppel memory list`).

pub mod apply;
pub mod chat;
pub mod memory;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat assistant that learns your style and remembers what you tell it.
#[derive(Parser)]
#[command(name = "doppel", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Inspect and edit a user's memory.
    #[command(alias = "mem")]
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },

    /// Save a fact using a trigger phrase ("remember that ...", "note that ...").
    Remember {
        /// Username.
        username: String,

        /// The message, starting with a trigger phrase.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Apply a generator reply: strip directive lines and execute them.
    Apply {
        /// Username.
        username: String,

        /// Read the reply from this file instead of stdin.
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Start an interactive chat session.
    Chat {
        /// Username.
        username: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user account.
    Create {
        /// Username.
        name: String,

        /// Instruction describing how to mimic this user.
        #[arg(long)]
        starting_command: Option<String>,
    },

    /// List user accounts.
    #[command(alias = "ls")]
    List,

    /// Show a user's profile.
    Show {
        /// Username.
        name: String,
    },

    /// Delete a user together with their memory and chat history.
    #[command(alias = "rm")]
    Delete {
        /// Username.
        name: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Record a style analysis for a user.
    SetAnalysis {
        /// Username.
        name: String,

        /// Read the analysis from this file instead of stdin.
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// List live memories.
    #[command(alias = "ls")]
    List {
        /// Username.
        username: String,
    },

    /// Save a memory.
    Save {
        /// Username.
        username: String,

        /// The fact to remember.
        text: String,

        /// Keep the memory only for this long (e.g. 30s, 10m, 2h, 1d).
        #[arg(long = "for", value_name = "TIME")]
        duration: Option<String>,
    },

    /// Delete memories by SNo or by text.
    #[command(alias = "rm")]
    Delete {
        /// Username.
        username: String,

        /// SNo (digits only) or text to match.
        selector: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Remove expired memories now.
    Sweep {
        /// Username.
        username: String,
    },
}
