//! Table port for the rows of one rendered task table body.

use crate::model::TaskId;

/// Opaque handle identifying one row for the lifetime of a table.
pub type RowKey = usize;

/// The rows of one table body, as rendered by the host page.
///
/// Row-to-task bindings belong to the host; this trait only exposes them.
pub trait RowTable {
    /// Returns all row handles in visual order, top to bottom.
    fn rows(&self) -> Vec<RowKey>;

    /// Returns the task id bound to `row`, if the row carries one.
    fn task_id(&self, row: RowKey) -> Option<TaskId>;

    /// Whether `row` is part of the current bulk selection.
    fn is_selected(&self, row: RowKey) -> bool;

    /// Returns the depth last stamped on `row`.
    fn depth(&self, row: RowKey) -> Option<usize>;

    /// Stamps `row` with its indentation depth.
    fn set_depth(&mut self, row: RowKey, depth: usize);

    /// Moves `row` so it immediately follows `anchor`.
    fn move_after(&mut self, row: RowKey, anchor: RowKey);

    /// Removes `row` from the table.
    fn remove(&mut self, row: RowKey);

    /// Returns the first row bound to `task_id`.
    fn find_row(&self, task_id: TaskId) -> Option<RowKey> {
        self.rows().into_iter().find(|&row| self.task_id(row) == Some(task_id))
    }

    /// Returns the task ids of all rows, deduplicated, in visual order.
    fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = Vec::new();
        for row in self.rows() {
            if let Some(id) = self.task_id(row) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Returns the rows currently in the bulk selection, in visual order.
    fn selected_rows(&self) -> Vec<RowKey> {
        self.rows().into_iter().filter(|&row| self.is_selected(row)).collect()
    }
}
