//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::model::{ProjectId, TaskId};

/// Top-level CLI parser for `tasktree`.
#[derive(Debug, Parser)]
#[command(name = "tasktree", version, about = "Inspect and rearrange task hierarchies")]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "TASKTREE_URL")]
    pub url: Option<String>,

    /// API token of the user to act as.
    #[arg(long, global = true, env = "TASKTREE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "TASKTREE_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Serve all requests from a recorded cassette instead of the network.
    #[arg(long, global = true, value_name = "CASSETTE")]
    pub replay: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve tasks and print them in hierarchical order.
    Tree {
        /// Task ids forming the view, in display order.
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
    /// Drag tasks onto another task, out of their parent, or to a project.
    Move {
        /// Tasks to drag.
        #[arg(required = true)]
        ids: Vec<TaskId>,
        /// Where to drop them.
        #[command(flatten)]
        target: MoveTarget,
        /// Other tasks shown in the same view.
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        view: Vec<TaskId>,
    },
    /// Merge fields into one task and save the full record.
    Update {
        /// Task to update.
        id: TaskId,
        /// Field assignment as `key=value`; values are parsed as JSON when possible.
        #[arg(long = "set", required = true, value_parser = parse_assignment)]
        set: Vec<(String, Value)>,
    },
    /// Apply the same fields to several tasks with one request.
    Bulk {
        /// Tasks to update.
        #[arg(required = true)]
        ids: Vec<TaskId>,
        /// Field assignment as `key=value`; values are parsed as JSON when possible.
        #[arg(long = "set", required = true, value_parser = parse_assignment)]
        set: Vec<(String, Value)>,
    },
    /// Show the logged-in user.
    Whoami,
}

/// Drop target of `move`; exactly one must be given.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct MoveTarget {
    /// Make the tasks children of this task.
    #[arg(long)]
    pub onto: Option<TaskId>,
    /// Remove the tasks' parent relation.
    #[arg(long)]
    pub detach: bool,
    /// Move the tasks into this project.
    #[arg(long)]
    pub project: Option<ProjectId>,
}

/// Parses `key=value`, reading the value as JSON and falling back to a string.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
