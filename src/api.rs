//! Endpoint client for the task backend.
//!
//! Every remote call the core issues goes through [`TaskApi`], which turns
//! domain operations into [`ApiRequest`]s on a [`Transport`] and maps
//! non-2xx statuses to [`Error::Status`].

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::model::{Task, TaskId, User};
use crate::ports::{ApiRequest, ApiResponse, Method, Transport};

/// Relation kind used for the single-parent hierarchy.
pub const PARENT_RELATION: &str = "parenttask";

/// Cheaply cloneable client over a shared transport.
#[derive(Clone)]
pub struct TaskApi {
    transport: Arc<dyn Transport>,
}

impl TaskApi {
    /// Creates a client over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = request.method;
        let path = request.path.clone();
        tracing::trace!(%method, %path, "sending request");
        let response = self.transport.send(request).await.map_err(|source| Error::Transport {
            method: method.to_string(),
            path: path.clone(),
            source,
        })?;
        if !response.is_success() {
            return Err(Error::Status { method: method.to_string(), path, status: response.status });
        }
        Ok(response)
    }

    /// Fetches every task matching `id in {ids}` in one request.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// that is not an array of task records.
    pub async fn fetch_batch(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        let list = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let request = ApiRequest::new(Method::Get, "/api/v1/tasks/all")
            .with_query("filter", format!("id in {list}"));
        let response = self.call(request).await?;
        if response.body.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(response.body)?)
    }

    /// Fetches the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a malformed body.
    pub async fn current_user(&self) -> Result<User> {
        let response = self.call(ApiRequest::new(Method::Get, "/api/v1/user")).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    /// Posts a task body to `/tasks/{id}` and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a malformed body.
    pub async fn update_task(&self, id: TaskId, body: Map<String, Value>) -> Result<Task> {
        let request = ApiRequest::new(Method::Post, format!("/api/v1/tasks/{id}"))
            .with_body(Value::Object(body));
        let response = self.call(request).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    /// Applies the same field values to every task in `ids`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn bulk_update(&self, ids: &[TaskId], fields: &Map<String, Value>) -> Result<()> {
        let mut body = fields.clone();
        body.insert("task_ids".to_string(), json!(ids));
        let request =
            ApiRequest::new(Method::Post, "/api/v1/tasks/bulk").with_body(Value::Object(body));
        self.call(request).await?;
        Ok(())
    }

    /// Adds a `parenttask` relation from `task` to `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn add_parent(&self, task: TaskId, parent: TaskId) -> Result<()> {
        let request = ApiRequest::new(Method::Put, format!("/api/v1/tasks/{task}/relations"))
            .with_body(json!({ "relation_kind": PARENT_RELATION, "other_task_id": parent }));
        self.call(request).await?;
        Ok(())
    }

    /// Removes the `parenttask` relation from `task` to `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn remove_parent(&self, task: TaskId, parent: TaskId) -> Result<()> {
        let request = ApiRequest::new(
            Method::Delete,
            format!("/api/v1/tasks/{task}/relations/{PARENT_RELATION}/{parent}"),
        );
        self.call(request).await?;
        Ok(())
    }
}
