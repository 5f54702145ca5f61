//! Command dispatch and handlers.

pub mod move_task;
pub mod tree;
pub mod update;
pub mod whoami;

use std::env;
use std::fmt::Write as _;
use std::future::Future;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::adapters::memory::MemoryTable;
use crate::cli::{Cli, Command};
use crate::config::ClientConfig;
use crate::context::ServiceContext;
use crate::ports::RowTable;
use crate::store::TaskStore;

/// Dispatch a parsed command to its handler.
///
/// `--replay` serves every request from a cassette. Otherwise the backend is
/// reached live, and when `TASKTREE_RECORD` is set to a file path every
/// exchange is recorded there.
///
/// # Errors
///
/// Returns an error string if configuration is incomplete or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let ctx = context_for(cli)?;
    block_on(dispatch_with_context(&cli.command, &ctx))
}

fn context_for(cli: &Cli) -> Result<ServiceContext, String> {
    if let Some(path) = &cli.replay {
        return ServiceContext::replaying(path);
    }
    let config = ClientConfig::new(cli.url.as_deref(), cli.token.as_deref(), cli.timeout)
        .map_err(|e| e.to_string())?;
    match env::var("TASKTREE_RECORD") {
        Ok(path) if !path.trim().is_empty() => ServiceContext::recording(&config, &PathBuf::from(path)),
        _ => ServiceContext::live(&config),
    }
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the command handler fails.
pub async fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<(), String> {
    let mut out = String::new();
    match command {
        Command::Tree { ids } => tree::run(ctx, ids, &mut out).await?,
        Command::Move { ids, target, view } => move_task::run(ctx, ids, target, view, &mut out).await?,
        Command::Update { id, set } => update::run_single(ctx, *id, &fields(set), &mut out).await?,
        Command::Bulk { ids, set } => update::run_bulk(ctx, ids, &fields(set), &mut out).await?,
        Command::Whoami => whoami::run(ctx, &mut out).await?,
    }
    print!("{out}");
    Ok(())
}

fn block_on<F: Future<Output = Result<(), String>>>(future: F) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;
    runtime.block_on(future)
}

fn fields(assignments: &[(String, Value)]) -> Map<String, Value> {
    assignments.iter().cloned().collect()
}

/// Renders `table` top to bottom, indenting each row by its depth.
pub(crate) fn render_tree(table: &MemoryTable, store: &TaskStore, out: &mut String) {
    for row in table.rows() {
        let indent = "  ".repeat(table.depth(row).unwrap_or(0));
        let Some(id) = table.task_id(row) else {
            let _ = writeln!(out, "{indent}(unbound row)");
            continue;
        };
        match store.get(id) {
            Some(task) => {
                let title = task.fields().get("title").and_then(Value::as_str).unwrap_or("");
                let mark = if task.fields().get("done").and_then(Value::as_bool).unwrap_or(false) { "x" } else { " " };
                let _ = writeln!(out, "{indent}[{mark}] #{id} {title}");
            }
            None => {
                let _ = writeln!(out, "{indent}#{id} (not found)");
            }
        }
    }
}
