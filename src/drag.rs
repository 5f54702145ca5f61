//! Drag-and-drop coordination over the parent relation graph.
//!
//! A drag starts from a bulk-selected row and carries the whole selection.
//! Candidate targets are validated against the target's ancestor chain so a
//! task can never be dropped onto its own descendant. A drop detaches each
//! top-level dragged task from its old parent, applies the target's change,
//! then clears the store, refetches every row and reorders the table. The
//! backend is trusted as ground truth afterwards; nothing is rolled back.

use std::mem;
use std::sync::Arc;

use serde_json::{json, Map};
use tokio::task::JoinSet;

use crate::api::TaskApi;
use crate::error::Result;
use crate::hierarchy::HierarchyResolver;
use crate::model::{ProjectId, Task, TaskId};
use crate::observer::ObserverGate;
use crate::ports::{RowKey, RowTable};
use crate::reorder::RowReorderer;

/// Where the dragged selection is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Onto a row: reparent under that row's task.
    Row(RowKey),
    /// Onto empty table body: detach from any parent, keep the project.
    Body,
    /// Onto a project link: move to that project and detach.
    Project(ProjectId),
}

/// Gesture state between drag start and drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A selection is being dragged.
    Dragging {
        /// Rows selected when the drag began.
        rows: Vec<RowKey>,
        /// Tasks bound to those rows.
        tasks: Vec<TaskId>,
    },
}

/// A relation or update request that failed during a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    /// Task whose mutation failed.
    pub task: TaskId,
    /// Which request failed.
    pub step: &'static str,
    /// Error text.
    pub error: String,
}

/// What a drop did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Top-level tasks that were mutated, in selection order.
    pub moved: Vec<TaskId>,
    /// Requests that failed; they are not retried.
    pub failures: Vec<MutationFailure>,
    /// Rows moved by the settle reorder.
    pub reordered: usize,
}

#[derive(Debug, Clone, Copy)]
enum DropAction {
    Reparent(TaskId),
    Detach,
    MoveProject(ProjectId),
}

/// Runs the drag state machine for one table.
pub struct DragCoordinator {
    resolver: HierarchyResolver,
    reorderer: RowReorderer,
    gate: Arc<ObserverGate>,
    current_project: Option<ProjectId>,
    state: DragState,
}

impl DragCoordinator {
    /// Creates an idle coordinator.
    ///
    /// `current_project` is the project shown by the table; dropping onto its
    /// own project link is rejected.
    #[must_use]
    pub fn new(
        resolver: HierarchyResolver,
        reorderer: RowReorderer,
        gate: Arc<ObserverGate>,
        current_project: Option<ProjectId>,
    ) -> Self {
        Self { resolver, reorderer, gate, current_project, state: DragState::Idle }
    }

    /// Current gesture state.
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Starts a drag from `origin`.
    ///
    /// Only a bulk-selected row can start a drag; the dragged set is a
    /// snapshot of the whole selection. Returns whether the drag started.
    pub fn begin(&mut self, table: &dyn RowTable, origin: RowKey) -> bool {
        if !table.is_selected(origin) {
            self.state = DragState::Idle;
            return false;
        }
        let rows = table.selected_rows();
        let mut tasks: Vec<TaskId> = Vec::new();
        for id in rows.iter().filter_map(|&row| table.task_id(row)) {
            if !tasks.contains(&id) {
                tasks.push(id);
            }
        }
        tracing::debug!(?tasks, "drag started");
        self.state = DragState::Dragging { rows, tasks };
        true
    }

    /// Abandons the current drag without mutating anything.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Whether releasing the current drag over `target` would be accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the target's ancestors fails.
    pub async fn accepts(&self, table: &dyn RowTable, target: DropTarget) -> Result<bool> {
        match &self.state {
            DragState::Idle => Ok(false),
            DragState::Dragging { tasks, .. } => self.validate(tasks, table, target).await,
        }
    }

    async fn validate(&self, dragged: &[TaskId], table: &dyn RowTable, target: DropTarget) -> Result<bool> {
        match target {
            DropTarget::Row(row) => {
                if table.is_selected(row) {
                    return Ok(false);
                }
                let Some(target_id) = table.task_id(row) else {
                    return Ok(false);
                };
                if dragged.contains(&target_id) {
                    return Ok(false);
                }
                let ancestors = self.resolver.ancestor_chain(target_id).await?;
                if let Some(&id) = ancestors.iter().find(|&id| dragged.contains(id)) {
                    tracing::debug!(task = id, target = target_id, "rejecting drop onto descendant");
                    return Ok(false);
                }
                Ok(true)
            }
            DropTarget::Body => Ok(true),
            DropTarget::Project(project) => Ok(project > 0 && Some(project) != self.current_project),
        }
    }

    /// Keeps only dragged tasks that have no dragged ancestor.
    async fn top_level(&self, dragged: &[TaskId]) -> Result<Vec<TaskId>> {
        let mut top = Vec::with_capacity(dragged.len());
        for &id in dragged {
            let ancestors = self.resolver.ancestor_chain(id).await?;
            if !ancestors.iter().any(|a| *a != id && dragged.contains(a)) {
                top.push(id);
            }
        }
        Ok(top)
    }

    /// Releases the current drag over `target` and commits it.
    ///
    /// Invalid targets end the drag without any request. Per-task requests
    /// run concurrently; for a single task the old parent is always removed
    /// before anything else is applied. Whatever the requests did, the store
    /// is cleared and the table refetched and reordered afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the dragged tasks or the settle
    /// refetch fails. Failed mutation requests are reported, not returned.
    pub async fn drop_on(&mut self, table: &mut dyn RowTable, target: DropTarget) -> Result<CommitReport> {
        let DragState::Dragging { rows, tasks } = mem::take(&mut self.state) else {
            return Ok(CommitReport::default());
        };
        if !self.validate(&tasks, table, target).await? {
            return Ok(CommitReport::default());
        }

        let gate = Arc::clone(&self.gate);
        let _paused = gate.pause();

        let action = match target {
            DropTarget::Row(row) => match table.task_id(row) {
                Some(id) => DropAction::Reparent(id),
                None => return Ok(CommitReport::default()),
            },
            DropTarget::Body => DropAction::Detach,
            DropTarget::Project(project) => DropAction::MoveProject(project),
        };

        let top = self.top_level(&tasks).await?;
        let fetcher = self.resolver.fetcher();
        let resolved: Vec<Task> = fetcher.resolve(&top).await?.into_iter().flatten().collect();

        let mut report = CommitReport { moved: resolved.iter().map(|t| t.id).collect(), ..CommitReport::default() };
        let mut pending = JoinSet::new();
        for task in resolved {
            pending.spawn(apply(fetcher.api().clone(), task, action));
        }
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok(failures) => report.failures.extend(failures),
                Err(err) => tracing::warn!(%err, "mutation task aborted"),
            }
        }
        for failure in &report.failures {
            tracing::warn!(task = failure.task, step = failure.step, error = %failure.error, "drop mutation failed");
        }

        if matches!(action, DropAction::MoveProject(_)) {
            // Only tasks whose move went through have left the view; carried
            // descendants and failed moves stay in the current project.
            let left: Vec<TaskId> = report
                .moved
                .iter()
                .copied()
                .filter(|id| !report.failures.iter().any(|f| f.task == *id))
                .collect();
            for row in rows {
                if table.task_id(row).is_some_and(|id| left.contains(&id)) {
                    table.remove(row);
                }
            }
        }

        fetcher.store().clear();
        fetcher.resolve(&table.task_ids()).await?;
        report.reordered = self.reorderer.reorder(table).await?;
        Ok(report)
    }
}

/// Applies one task's share of a drop: detach, then the target's change.
async fn apply(api: TaskApi, task: Task, action: DropAction) -> Vec<MutationFailure> {
    let id = task.id;
    let fail = |step, err: crate::error::Error| vec![MutationFailure { task: id, step, error: err.to_string() }];

    if let Some(parent) = task.parent {
        if let Err(err) = api.remove_parent(id, parent.id).await {
            return fail("remove parent", err);
        }
    }
    let result = match action {
        DropAction::Reparent(target) => api.add_parent(id, target).await,
        DropAction::Detach => Ok(()),
        DropAction::MoveProject(project) => {
            let mut change = Map::new();
            change.insert("project_id".to_string(), json!(project));
            api.update_task(id, task.merged_with(&change)).await.map(|_| ())
        }
    };
    match result {
        Ok(()) => Vec::new(),
        Err(err) => fail(
            match action {
                DropAction::Reparent(_) => "add parent",
                DropAction::Detach => "detach",
                DropAction::MoveProject(_) => "move project",
            },
            err,
        ),
    }
}
