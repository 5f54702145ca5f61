//! Batch fetcher resolving task ids through the store.

use std::sync::Arc;

use crate::api::TaskApi;
use crate::error::Result;
use crate::model::{Task, TaskId};
use crate::store::TaskStore;

/// Resolves task ids to records, fetching only what the store lacks.
#[derive(Clone)]
pub struct BatchFetcher {
    api: TaskApi,
    store: Arc<TaskStore>,
}

impl BatchFetcher {
    /// Creates a fetcher writing into `store`.
    #[must_use]
    pub fn new(api: TaskApi, store: Arc<TaskStore>) -> Self {
        Self { api, store }
    }

    /// The client used for fetch rounds.
    #[must_use]
    pub fn api(&self) -> &TaskApi {
        &self.api
    }

    /// The store this fetcher fills.
    #[must_use]
    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Resolves `ids` to tasks, preserving order and duplicates.
    ///
    /// Missing ids are requested with `id in {remaining}` queries until
    /// nothing is outstanding or a round brings back no new id. Ids the
    /// backend never returns come back as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if any fetch round fails; nothing fetched in earlier
    /// rounds is rolled back.
    pub async fn resolve(&self, ids: &[TaskId]) -> Result<Vec<Option<Task>>> {
        let mut remaining: Vec<TaskId> = Vec::new();
        for &id in ids {
            if !remaining.contains(&id) && !self.store.contains(id) {
                remaining.push(id);
            }
        }

        let mut round = 0;
        while !remaining.is_empty() {
            round += 1;
            let fetched = self.api.fetch_batch(&remaining).await?;
            let new_ids: Vec<TaskId> =
                fetched.iter().map(|task| task.id).filter(|id| remaining.contains(id)).collect();
            for task in fetched {
                self.store.put(task);
            }
            remaining.retain(|id| !new_ids.contains(id));
            tracing::debug!(round, fetched = new_ids.len(), outstanding = remaining.len(), "batch fetch round");
            if new_ids.is_empty() {
                if !remaining.is_empty() {
                    tracing::debug!(?remaining, "ids not returned by backend");
                }
                break;
            }
        }

        Ok(ids.iter().map(|&id| self.store.get(id)).collect())
    }

    /// Resolves a single id.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    pub async fn resolve_one(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.resolve(&[id]).await?.pop().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{Fault, MemoryBackend};
    use crate::error::Error;
    use crate::ports::Method;

    const BATCH: &str = "/api/v1/tasks/all";

    fn fetcher(backend: &Arc<MemoryBackend>) -> BatchFetcher {
        BatchFetcher::new(TaskApi::new(backend.clone()), Arc::new(TaskStore::new()))
    }

    #[tokio::test]
    async fn repeated_ids_hit_the_cache() {
        let backend = Arc::new(MemoryBackend::new().with_task(5, 1, None).with_task(7, 1, None));
        let fetcher = fetcher(&backend);

        let tasks = fetcher.resolve(&[5, 5, 7]).await.unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.as_ref().map(|t| t.id)).collect();
        assert_eq!(ids, vec![Some(5), Some(5), Some(7)]);

        fetcher.resolve(&[5]).await.unwrap();
        assert_eq!(backend.count(Method::Get, BATCH), 1);
        let filter = backend.requests()[0].query_value("filter").unwrap().to_string();
        assert_eq!(filter, "id in 5,7");
    }

    #[tokio::test]
    async fn unknown_ids_stop_after_one_empty_round() {
        let backend = Arc::new(MemoryBackend::new().with_task(1, 1, None).with_task(2, 1, None));
        let fetcher = fetcher(&backend);

        let tasks = fetcher.resolve(&[1, 2, 3]).await.unwrap();
        assert!(tasks[0].is_some() && tasks[1].is_some());
        assert!(tasks[2].is_none());
        assert_eq!(backend.count(Method::Get, BATCH), 2);
    }

    #[tokio::test]
    async fn truncated_responses_are_followed_up() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_task(1, 1, None)
                .with_task(2, 1, None)
                .with_task(3, 1, None)
                .with_page_limit(2),
        );
        let fetcher = fetcher(&backend);

        let tasks = fetcher.resolve(&[3, 1, 2]).await.unwrap();
        assert!(tasks.iter().all(Option::is_some));
        let filters: Vec<String> = backend
            .requests()
            .iter()
            .filter_map(|r| r.query_value("filter").map(str::to_string))
            .collect();
        assert_eq!(filters, vec!["id in 3,1,2", "id in 2"]);
    }

    #[tokio::test]
    async fn cached_ids_are_not_requested() {
        let backend = Arc::new(MemoryBackend::new().with_task(1, 1, None).with_task(2, 1, None));
        let fetcher = fetcher(&backend);
        fetcher.resolve(&[1]).await.unwrap();
        fetcher.resolve(&[1, 2]).await.unwrap();
        let last = backend.requests().pop().unwrap();
        assert_eq!(last.query_value("filter"), Some("id in 2"));
    }

    #[tokio::test]
    async fn transport_failure_is_propagated() {
        let backend = Arc::new(
            MemoryBackend::new().with_task(1, 1, None).with_fault(Method::Get, BATCH, Fault::Transport),
        );
        let err = fetcher(&backend).resolve(&[1]).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn empty_request_issues_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        assert!(fetcher(&backend).resolve(&[]).await.unwrap().is_empty());
        assert!(backend.requests().is_empty());
    }
}
