//! Apply a generator reply produced outside of `doppel chat`.

use std::path::Path;

use anyhow::Result;
use console::style;

use doppel_core::directive::executor::DirectiveExecutor;
use doppel_core::directive::parser::parse_reply;

use crate::cli::memory::{execution_json, print_execution};
use crate::cli::user::read_input;
use crate::state::AppState;

/// Parse a reply, execute its directives, and print what the user would see.
///
/// # Examples
///
/// ```bash
/// my-llm < prompt.txt | doppel apply dhairya
/// doppel apply dhairya --file reply.txt
/// ```
pub async fn apply_reply(
    state: &AppState,
    username: &str,
    file: Option<&Path>,
    json: bool,
) -> Result<()> {
    let raw = read_input(file).await?;
    let (_, mut store) = state.open_memory(username).await?;

    let now = store.now();
    let mut expired = store.sweep(now).await?;

    let reply = parse_reply(&raw);
    let mut execution = DirectiveExecutor::execute(&mut store, &reply.directives).await?;
    expired.append(&mut execution.expired);
    execution.expired = expired;

    if json {
        let mut value = execution_json(&execution);
        value["display"] = serde_json::Value::String(reply.display);
        value["memory_referenced"] = serde_json::Value::Bool(reply.memory_referenced);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if !reply.display.is_empty() {
        println!();
        for line in reply.display.lines() {
            println!("  {line}");
        }
        println!();
    }
    if reply.memory_referenced {
        println!("  {}", style("(drew on stored memory)").dim());
    }
    print_execution(&execution, false)
}
