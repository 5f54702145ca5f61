//! Task record and its single effective parent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend-assigned task identifier.
pub type TaskId = i64;

/// Backend-assigned project identifier.
pub type ProjectId = i64;

/// Reference to a task's effective parent.
///
/// The backend embeds parents as a list of task records under
/// `related_tasks.parenttask`; only element 0 counts for hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef {
    /// Parent task id.
    pub id: TaskId,
    /// Project of the parent as embedded in the child record, if present.
    pub project_id: Option<ProjectId>,
}

/// A task record as last fetched from the backend.
///
/// `id`, `project_id` and `parent` are typed views over the raw record;
/// everything else is opaque and round-trips unchanged through `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Task {
    /// Task id.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Effective parent, if any.
    pub parent: Option<ParentRef>,
    fields: Map<String, Value>,
}

impl Task {
    /// Returns the raw record as sent by the backend.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the raw record as a JSON value.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Returns the raw record with `partial` shallow-merged over it.
    #[must_use]
    pub fn merged_with(&self, partial: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.fields.clone();
        for (key, value) in partial {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Shallow-merges `partial` into this record.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves the task unchanged if the merged record
    /// no longer has a valid `id`.
    pub fn patch(&mut self, partial: &Map<String, Value>) -> Result<(), String> {
        let patched = Self::try_from(self.merged_with(partial))?;
        *self = patched;
        Ok(())
    }
}

fn parent_from(fields: &Map<String, Value>) -> Option<ParentRef> {
    let first = fields
        .get("related_tasks")?
        .get("parenttask")?
        .as_array()?
        .first()?;
    let id = first.get("id")?.as_i64()?;
    let project_id = first.get("project_id").and_then(Value::as_i64);
    Some(ParentRef { id, project_id })
}

impl TryFrom<Map<String, Value>> for Task {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| "task record has no integer `id`".to_string())?;
        let project_id = fields.get("project_id").and_then(Value::as_i64).unwrap_or_default();
        let parent = parent_from(&fields);
        Ok(Self { id, project_id, parent, fields })
    }
}

impl From<Task> for Map<String, Value> {
    fn from(task: Task) -> Self {
        task.fields
    }
}
