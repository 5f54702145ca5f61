//! Ancestor chains and indentation depth over the single-parent relation.
//!
//! Both walks keep a visited set so malformed, cyclic backend data ends the
//! walk at the first revisited id instead of looping.

use std::collections::HashSet;

use crate::error::Result;
use crate::fetch::BatchFetcher;
use crate::model::TaskId;

/// Walks parent relations through a [`BatchFetcher`].
#[derive(Clone)]
pub struct HierarchyResolver {
    fetcher: BatchFetcher,
}

impl HierarchyResolver {
    /// Creates a resolver reading through `fetcher`.
    #[must_use]
    pub fn new(fetcher: BatchFetcher) -> Self {
        Self { fetcher }
    }

    /// The fetcher used for lookups.
    #[must_use]
    pub fn fetcher(&self) -> &BatchFetcher {
        &self.fetcher
    }

    /// Returns the ancestors of `id`, closest first.
    ///
    /// An ancestor that cannot be resolved is still listed and ends the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch fails.
    pub async fn ancestor_chain(&self, id: TaskId) -> Result<Vec<TaskId>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = id;

        while let Some(task) = self.fetcher.resolve_one(current).await? {
            let Some(parent) = task.parent else { break };
            if !visited.insert(parent.id) {
                tracing::warn!(task = id, revisited = parent.id, "parent cycle in task data");
                break;
            }
            chain.push(parent.id);
            current = parent.id;
        }
        Ok(chain)
    }

    /// Returns the indentation depth of `id`.
    ///
    /// Counts parents up the chain while they belong to the same project as
    /// `id`; a parent in another project ends the walk. Unknown tasks have
    /// depth 0.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch fails.
    pub async fn depth(&self, id: TaskId) -> Result<usize> {
        let Some(base) = self.fetcher.resolve_one(id).await? else {
            return Ok(0);
        };
        let mut depth = 0;
        let mut visited = HashSet::from([id]);
        let mut current = base.clone();

        while let Some(parent) = current.parent {
            if !visited.insert(parent.id) {
                tracing::warn!(task = id, revisited = parent.id, "parent cycle in task data");
                break;
            }
            let resolved = self.fetcher.resolve_one(parent.id).await?;
            let parent_project = parent.project_id.or(resolved.as_ref().map(|t| t.project_id));
            if parent_project != Some(base.project_id) {
                break;
            }
            depth += 1;
            match resolved {
                Some(task) => current = task,
                None => break,
            }
        }
        Ok(depth)
    }
}
