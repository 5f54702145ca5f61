//! Task store: a request-scoped cache of task records and the current user.
//!
//! There is no eviction beyond a full [`TaskStore::clear`]; the store is
//! bounded by the number of tasks visible in one view. Structural mutations
//! (parent, relation, project) must clear it because depths anywhere in the
//! tree can change with a single relation edit.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::api::TaskApi;
use crate::error::Result;
use crate::model::{Task, TaskId, User};

#[derive(Default)]
struct StoreState {
    tasks: HashMap<TaskId, Task>,
    user: Option<User>,
}

/// In-memory cache keyed by task id.
///
/// Locks are held only for the duration of a single call, never across an
/// await point.
#[derive(Default)]
pub struct TaskStore {
    state: Mutex<StoreState>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoned lock only means another caller panicked mid-call; the
        // map itself is still consistent.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns a copy of the cached task.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.lock().tasks.get(&id).cloned()
    }

    /// Whether `id` is cached.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.lock().tasks.contains_key(&id)
    }

    /// Inserts or overwrites a task.
    pub fn put(&self, task: Task) {
        self.lock().tasks.insert(task.id, task);
    }

    /// Shallow-merges `partial` into the cached task.
    ///
    /// Returns `false` without changing anything if `id` is not cached or the
    /// merged record would be invalid.
    pub fn patch(&self, id: TaskId, partial: &Map<String, Value>) -> bool {
        let mut state = self.lock();
        let Some(task) = state.tasks.get_mut(&id) else {
            return false;
        };
        match task.patch(partial) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(task = id, %err, "ignoring invalid cache patch");
                false
            }
        }
    }

    /// Removes every cached task. The cached user is kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        tracing::debug!(entries = state.tasks.len(), "clearing task cache");
        state.tasks.clear();
    }

    /// Removes every cached task and the cached user.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.tasks.clear();
        state.user = None;
    }

    /// Number of cached tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Whether no tasks are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Returns the current user, fetching it through `api` on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the user has to be fetched and the request fails.
    pub async fn current_user(&self, api: &TaskApi) -> Result<User> {
        let cached = self.lock().user.clone();
        if let Some(user) = cached {
            return Ok(user);
        }
        let user = api.current_user().await?;
        self.lock().user = Some(user.clone());
        Ok(user)
    }
}
