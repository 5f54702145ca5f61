//! In-memory `RowTable` used by the CLI and tests.

use crate::model::TaskId;
use crate::ports::{RowKey, RowTable};

/// One row of a [`MemoryTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    /// Stable handle.
    pub key: RowKey,
    /// Bound task, `None` for rows without a task link.
    pub task_id: Option<TaskId>,
    /// Bulk-selection state.
    pub selected: bool,
    /// Last stamped depth.
    pub depth: Option<usize>,
}

/// A table body held as an ordered list of rows.
///
/// Counts effective moves so reorder passes can be checked for idempotence.
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Vec<MemoryRow>,
    next_key: RowKey,
    moves: usize,
}

impl MemoryTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with one row per id, in the given order.
    #[must_use]
    pub fn from_task_ids(ids: &[TaskId]) -> Self {
        let mut table = Self::new();
        for &id in ids {
            table.push(Some(id));
        }
        table
    }

    /// Appends a row and returns its handle.
    pub fn push(&mut self, task_id: Option<TaskId>) -> RowKey {
        let key = self.next_key;
        self.next_key += 1;
        self.rows.push(MemoryRow { key, task_id, selected: false, depth: None });
        key
    }

    /// Sets the bulk-selection state of `row`.
    pub fn set_selected(&mut self, row: RowKey, selected: bool) {
        if let Some(r) = self.rows.iter_mut().find(|r| r.key == row) {
            r.selected = selected;
        }
    }

    /// Selects every row bound to one of `ids`.
    pub fn select_tasks(&mut self, ids: &[TaskId]) {
        for row in &mut self.rows {
            row.selected = row.task_id.is_some_and(|id| ids.contains(&id));
        }
    }

    /// Returns the rows in visual order.
    #[must_use]
    pub fn snapshot(&self) -> &[MemoryRow] {
        &self.rows
    }

    /// Returns bound task ids in visual order.
    #[must_use]
    pub fn order(&self) -> Vec<TaskId> {
        self.rows.iter().filter_map(|r| r.task_id).collect()
    }

    /// Returns the depth stamped on the first row bound to `id`.
    #[must_use]
    pub fn depth_of(&self, id: TaskId) -> Option<usize> {
        self.rows.iter().find(|r| r.task_id == Some(id)).and_then(|r| r.depth)
    }

    /// Number of `move_after` calls that changed the order.
    #[must_use]
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Resets the move counter.
    pub fn reset_moves(&mut self) {
        self.moves = 0;
    }

    fn index_of(&self, row: RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.key == row)
    }
}

impl RowTable for MemoryTable {
    fn rows(&self) -> Vec<RowKey> {
        self.rows.iter().map(|r| r.key).collect()
    }

    fn task_id(&self, row: RowKey) -> Option<TaskId> {
        self.index_of(row).and_then(|i| self.rows[i].task_id)
    }

    fn is_selected(&self, row: RowKey) -> bool {
        self.index_of(row).is_some_and(|i| self.rows[i].selected)
    }

    fn depth(&self, row: RowKey) -> Option<usize> {
        self.index_of(row).and_then(|i| self.rows[i].depth)
    }

    fn set_depth(&mut self, row: RowKey, depth: usize) {
        if let Some(i) = self.index_of(row) {
            self.rows[i].depth = Some(depth);
        }
    }

    fn move_after(&mut self, row: RowKey, anchor: RowKey) {
        if row == anchor {
            return;
        }
        let (Some(from), Some(to)) = (self.index_of(row), self.index_of(anchor)) else {
            return;
        };
        if from == to + 1 {
            return;
        }
        let moved = self.rows.remove(from);
        let anchor_index = if from < to { to - 1 } else { to };
        self.rows.insert(anchor_index + 1, moved);
        self.moves += 1;
    }

    fn remove(&mut self, row: RowKey) {
        self.rows.retain(|r| r.key != row);
    }
}
