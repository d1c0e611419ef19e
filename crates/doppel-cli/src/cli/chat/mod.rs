//! Interactive chat for Doppel.
//!
//! Runs conversational turns against the configured generator with a
//! spinner while it works, handles slash commands, and prints memory notices
//! after each reply. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
