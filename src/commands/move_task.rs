//! `tasktree move` command.

use std::fmt::Write as _;

use crate::adapters::memory::MemoryTable;
use crate::cli::MoveTarget;
use crate::context::ServiceContext;
use crate::drag::DropTarget;
use crate::model::TaskId;
use crate::ports::RowTable;
use crate::view::TableSession;

use super::render_tree;

/// Execute the `move` command.
///
/// Builds a view from `view` plus the dragged ids, selects the dragged rows,
/// and performs one drag from the first of them onto the requested target.
/// The view's project is the project of the first dragged task.
///
/// # Errors
///
/// Returns an error string if the target is rejected, a fetch fails, or any
/// mutation request fails.
pub async fn run(
    ctx: &ServiceContext,
    ids: &[TaskId],
    target: &MoveTarget,
    view: &[TaskId],
    out: &mut String,
) -> Result<(), String> {
    let api = ctx.api();
    let first = ids.first().copied().ok_or("no tasks to move")?;
    let current_project = api
        .fetch_batch(&[first])
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .next()
        .map(|task| task.project_id)
        .ok_or_else(|| format!("task #{first} not found"))?;

    let mut rows: Vec<TaskId> = view.to_vec();
    for &id in ids.iter().chain(target.onto.iter()) {
        if !rows.contains(&id) {
            rows.push(id);
        }
    }
    let mut table = MemoryTable::from_task_ids(&rows);
    let mut session = TableSession::new(api, Some(current_project));
    session.refresh(&mut table).await.map_err(|e| e.to_string())?;
    table.select_tasks(ids);

    let origin = table.find_row(first).ok_or_else(|| format!("task #{first} is not in the view"))?;
    let drop_target = match (target.onto, target.project) {
        (Some(onto), _) => {
            DropTarget::Row(table.find_row(onto).ok_or_else(|| format!("task #{onto} is not in the view"))?)
        }
        (None, Some(project)) => DropTarget::Project(project),
        (None, None) => DropTarget::Body,
    };

    session.begin_drag(&table, origin);
    if !session.accepts(&table, drop_target).await.map_err(|e| e.to_string())? {
        session.cancel_drag();
        return Err(describe_rejection(target));
    }
    let report = session.drop_on(&mut table, drop_target).await.map_err(|e| e.to_string())?;

    let moved: Vec<String> = report.moved.iter().map(|id| format!("#{id}")).collect();
    let _ = writeln!(out, "Moved {}", moved.join(", "));
    render_tree(&table, session.store(), out);

    if report.failures.is_empty() {
        Ok(())
    } else {
        let lines: Vec<String> =
            report.failures.iter().map(|f| format!("#{} {}: {}", f.task, f.step, f.error)).collect();
        Err(format!("{} request(s) failed:\n{}", report.failures.len(), lines.join("\n")))
    }
}

fn describe_rejection(target: &MoveTarget) -> String {
    match (target.onto, target.project) {
        (Some(onto), _) => format!("cannot drop onto #{onto}: it is dragged or a descendant of a dragged task"),
        (None, Some(project)) => format!("cannot move to project {project}: it is the current project or invalid"),
        (None, None) => "cannot detach".to_string(),
    }
}
