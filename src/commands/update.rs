//! `tasktree update` and `tasktree bulk` commands.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::context::ServiceContext;
use crate::model::TaskId;
use crate::view::TableSession;

/// Execute the `update` command.
///
/// # Errors
///
/// Returns an error string if the task does not exist or the update fails.
pub async fn run_single(
    ctx: &ServiceContext,
    id: TaskId,
    fields: &Map<String, Value>,
    out: &mut String,
) -> Result<(), String> {
    let session = TableSession::new(ctx.api(), None);
    let task = session
        .update_task(id, fields)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("task #{id} not found"))?;
    let _ = writeln!(out, "Updated #{}", task.id);
    for key in fields.keys() {
        let value = task.fields().get(key).unwrap_or(&Value::Null);
        let _ = writeln!(out, "  {key} = {value}");
    }
    Ok(())
}

/// Execute the `bulk` command.
///
/// # Errors
///
/// Returns an error string if the bulk request fails.
pub async fn run_bulk(
    ctx: &ServiceContext,
    ids: &[TaskId],
    fields: &Map<String, Value>,
    out: &mut String,
) -> Result<(), String> {
    let session = TableSession::new(ctx.api(), None);
    session.bulk_update(ids, fields).await.map_err(|e| e.to_string())?;
    let listed: Vec<String> = ids.iter().map(|id| format!("#{id}")).collect();
    let _ = writeln!(out, "Updated {} task(s): {}", ids.len(), listed.join(", "));
    Ok(())
}
