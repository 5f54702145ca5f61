//! Table session: one view's cache, hierarchy pipeline and drag state.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::TaskApi;
use crate::drag::{CommitReport, DragCoordinator, DropTarget};
use crate::error::Result;
use crate::fetch::BatchFetcher;
use crate::hierarchy::HierarchyResolver;
use crate::model::{ProjectId, Task, TaskId, User};
use crate::observer::ObserverGate;
use crate::ports::{RowKey, RowTable};
use crate::reorder::RowReorderer;
use crate::store::TaskStore;

/// Everything one rendered task table needs, wired to a single store.
pub struct TableSession {
    fetcher: BatchFetcher,
    resolver: HierarchyResolver,
    reorderer: RowReorderer,
    coordinator: DragCoordinator,
    gate: Arc<ObserverGate>,
}

impl TableSession {
    /// Creates a session with an empty store.
    ///
    /// `current_project` is the project the table shows, if any.
    #[must_use]
    pub fn new(api: TaskApi, current_project: Option<ProjectId>) -> Self {
        let store = Arc::new(TaskStore::new());
        let fetcher = BatchFetcher::new(api, store);
        let resolver = HierarchyResolver::new(fetcher.clone());
        let reorderer = RowReorderer::new(resolver.clone());
        let gate = Arc::new(ObserverGate::new());
        let coordinator =
            DragCoordinator::new(resolver.clone(), reorderer.clone(), Arc::clone(&gate), current_project);
        Self { fetcher, resolver, reorderer, coordinator, gate }
    }

    /// The session's task store.
    #[must_use]
    pub fn store(&self) -> &TaskStore {
        self.fetcher.store()
    }

    /// The session's batch fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &BatchFetcher {
        &self.fetcher
    }

    /// The session's hierarchy resolver.
    #[must_use]
    pub fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }

    /// The gate that suppresses observer-driven refreshes.
    #[must_use]
    pub fn gate(&self) -> &ObserverGate {
        &self.gate
    }

    /// The drag coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &DragCoordinator {
        &self.coordinator
    }

    /// Reacts to a change in the rendered table.
    ///
    /// Does nothing while the gate is paused or the table is empty. On first
    /// load (rows present, none stamped with a depth) clears the store,
    /// resolves every row and reorders. Returns whether a refresh ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fetch fails.
    pub async fn on_table_mutation(&self, table: &mut dyn RowTable) -> Result<bool> {
        if !self.gate.is_active() {
            return Ok(false);
        }
        let rows = table.rows();
        if rows.is_empty() || rows.iter().any(|&row| table.depth(row).is_some()) {
            return Ok(false);
        }
        self.refresh(table).await?;
        Ok(true)
    }

    /// Clears the store, refetches every row's task and reorders the table.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails.
    pub async fn refresh(&self, table: &mut dyn RowTable) -> Result<usize> {
        let _paused = self.gate.pause();
        self.store().clear();
        self.fetcher.resolve(&table.task_ids()).await?;
        self.reorderer.reorder(table).await
    }

    /// Starts dragging the selection from `origin`.
    pub fn begin_drag(&mut self, table: &dyn RowTable, origin: RowKey) -> bool {
        self.coordinator.begin(table, origin)
    }

    /// Whether the current drag may be released over `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving ancestors fails.
    pub async fn accepts(&self, table: &dyn RowTable, target: DropTarget) -> Result<bool> {
        self.coordinator.accepts(table, target).await
    }

    /// Releases the current drag over `target`.
    ///
    /// # Errors
    ///
    /// See [`DragCoordinator::drop_on`].
    pub async fn drop_on(&mut self, table: &mut dyn RowTable, target: DropTarget) -> Result<CommitReport> {
        self.coordinator.drop_on(table, target).await
    }

    /// Abandons the current drag.
    pub fn cancel_drag(&mut self) {
        self.coordinator.cancel();
    }

    /// Updates one task by posting its full record with `partial` merged in.
    ///
    /// Returns `None` without issuing an update if the task is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving or updating fails.
    pub async fn update_task(&self, id: TaskId, partial: &Map<String, Value>) -> Result<Option<Task>> {
        let Some(task) = self.fetcher.resolve_one(id).await? else {
            return Ok(None);
        };
        let updated = self.fetcher.api().update_task(id, task.merged_with(partial)).await?;
        self.store().put(updated.clone());
        Ok(Some(updated))
    }

    /// Applies the same fields to every task in `ids` with one bulk request.
    ///
    /// # Errors
    ///
    /// Returns an error if the bulk request fails; the cache is then untouched.
    pub async fn bulk_update(&self, ids: &[TaskId], fields: &Map<String, Value>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.fetcher.api().bulk_update(ids, fields).await?;
        for &id in ids {
            self.store().patch(id, fields);
        }
        Ok(())
    }

    /// Applies `fields` to the tasks of all bulk-selected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the bulk request fails.
    pub async fn bulk_update_selection(&self, table: &dyn RowTable, fields: &Map<String, Value>) -> Result<Vec<TaskId>> {
        let ids: Vec<TaskId> = table.selected_rows().into_iter().filter_map(|row| table.task_id(row)).collect();
        self.bulk_update(&ids, fields).await?;
        Ok(ids)
    }

    /// The logged-in user, fetched once per session.
    ///
    /// # Errors
    ///
    /// Returns an error if the user has to be fetched and the request fails.
    pub async fn current_user(&self) -> Result<User> {
        self.store().current_user(self.fetcher.api()).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{Fault, MemoryBackend, MemoryTable};
    use crate::ports::Method;

    fn session(backend: &Arc<MemoryBackend>) -> TableSession {
        TableSession::new(TaskApi::new(backend.clone()), Some(9))
    }

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::new().with_task(1, 9, None).with_task(2, 9, Some(1)).with_task(3, 9, None))
    }

    #[tokio::test]
    async fn first_mutation_refreshes_then_settles() {
        let backend = backend();
        let s = session(&backend);
        let mut table = MemoryTable::from_task_ids(&[2, 1, 3]);

        assert!(s.on_table_mutation(&mut table).await.unwrap());
        assert_eq!(table.order(), vec![1, 2, 3]);
        assert!(!s.on_table_mutation(&mut table).await.unwrap());
    }

    #[tokio::test]
    async fn paused_gate_suppresses_refresh() {
        let backend = backend();
        let s = session(&backend);
        let mut table = MemoryTable::from_task_ids(&[2, 1]);
        let guard = s.gate().pause();
        assert!(!s.on_table_mutation(&mut table).await.unwrap());
        drop(guard);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_table_is_ignored() {
        let backend = backend();
        let s = session(&backend);
        let mut table = MemoryTable::new();
        assert!(!s.on_table_mutation(&mut table).await.unwrap());
    }

    #[tokio::test]
    async fn update_posts_merged_record_and_caches_response() {
        let backend = backend();
        let s = session(&backend);
        let partial = json!({"title": "Renamed"});
        let updated = s.update_task(2, partial.as_object().unwrap()).await.unwrap().unwrap();

        assert_eq!(updated.fields()["title"], json!("Renamed"));
        let posted = backend.requests().into_iter().find(|r| r.method == Method::Post).unwrap();
        let body = posted.body.unwrap();
        assert_eq!(body["title"], json!("Renamed"));
        assert_eq!(body["done"], json!(false));
        assert_eq!(s.store().get(2).unwrap().fields()["title"], json!("Renamed"));
    }

    #[tokio::test]
    async fn update_of_unknown_task_is_skipped() {
        let backend = backend();
        let s = session(&backend);
        assert!(s.update_task(40, &Map::new()).await.unwrap().is_none());
        assert_eq!(backend.count(Method::Post, "/api/v1/tasks/40"), 0);
    }

    #[tokio::test]
    async fn bulk_update_patches_cached_entries() {
        let backend = backend();
        let s = session(&backend);
        let mut table = MemoryTable::from_task_ids(&[1, 2, 3]);
        s.refresh(&mut table).await.unwrap();
        table.select_tasks(&[1, 3]);

        let fields = json!({"done": true});
        let ids = s.bulk_update_selection(&table, fields.as_object().unwrap()).await.unwrap();

        assert_eq!(ids, vec![1, 3]);
        let request = backend.requests().into_iter().find(|r| r.path == "/api/v1/tasks/bulk").unwrap();
        assert_eq!(request.body.unwrap(), json!({"done": true, "task_ids": [1, 3]}));
        assert_eq!(s.store().get(1).unwrap().fields()["done"], json!(true));
        assert_eq!(s.store().get(2).unwrap().fields()["done"], json!(false));
        assert_eq!(backend.task(3).unwrap()["done"], json!(true));
    }

    #[tokio::test]
    async fn failed_bulk_update_leaves_cache() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_task(1, 9, None)
                .with_fault(Method::Post, "/api/v1/tasks/bulk", Fault::Transport),
        );
        let s = session(&backend);
        s.fetcher().resolve(&[1]).await.unwrap();
        let fields = json!({"priority": 4});
        assert!(s.bulk_update(&[1], fields.as_object().unwrap()).await.is_err());
        assert!(s.store().get(1).unwrap().fields().get("priority").is_none());
    }

    #[tokio::test]
    async fn drag_through_session() {
        let backend = backend();
        let mut s = session(&backend);
        let mut table = MemoryTable::from_task_ids(&[1, 2, 3]);
        s.refresh(&mut table).await.unwrap();
        let rows = table.rows();
        table.select_tasks(&[3]);

        assert!(s.begin_drag(&table, rows[2]));
        assert!(s.accepts(&table, DropTarget::Row(rows[1])).await.unwrap());
        let report = s.drop_on(&mut table, DropTarget::Row(rows[1])).await.unwrap();

        assert_eq!(report.moved, vec![3]);
        assert_eq!(table.order(), vec![1, 2, 3]);
        assert_eq!(table.depth_of(3), Some(2));
    }
}
