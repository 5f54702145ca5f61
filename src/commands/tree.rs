//! `tasktree tree` command.

use crate::adapters::memory::MemoryTable;
use crate::context::ServiceContext;
use crate::model::TaskId;
use crate::view::TableSession;

use super::render_tree;

/// Execute the `tree` command.
///
/// Lays the ids out as table rows in the given order, then resolves and
/// reorders them so every child sits under its parent.
///
/// # Errors
///
/// Returns an error string if fetching fails.
pub async fn run(ctx: &ServiceContext, ids: &[TaskId], out: &mut String) -> Result<(), String> {
    let session = TableSession::new(ctx.api(), None);
    let mut table = MemoryTable::from_task_ids(ids);
    session.refresh(&mut table).await.map_err(|e| e.to_string())?;
    render_tree(&table, session.store(), out);
    Ok(())
}
