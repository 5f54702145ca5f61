//! In-process task backend implementing the `Transport` port.
//!
//! Understands the same endpoints the client issues, keeps every request in
//! a log for assertions, and can be told to truncate batch responses or fail
//! specific paths.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::error::BoxError;
use crate::model::{ProjectId, TaskId};
use crate::ports::{ApiRequest, ApiResponse, Method, Transport, TransportFuture};

/// How a matching request should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request never completes.
    Transport,
    /// The backend answers with this status.
    Status(u16),
}

#[derive(Default)]
struct BackendState {
    tasks: BTreeMap<TaskId, Map<String, Value>>,
    parents: BTreeMap<TaskId, Vec<TaskId>>,
    user: Option<Value>,
    page_limit: Option<usize>,
    faults: Vec<(Method, String, Fault)>,
    log: Vec<ApiRequest>,
}

/// Task backend held entirely in memory.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut BackendState {
        self.state.get_mut().expect("backend lock poisoned")
    }

    /// Adds a task titled `Task {id}` with an optional parent.
    #[must_use]
    pub fn with_task(mut self, id: TaskId, project_id: ProjectId, parent: Option<TaskId>) -> Self {
        let state = self.state_mut();
        let mut record = Map::new();
        record.insert("id".into(), json!(id));
        record.insert("project_id".into(), json!(project_id));
        record.insert("title".into(), json!(format!("Task {id}")));
        record.insert("done".into(), json!(false));
        state.tasks.insert(id, record);
        if let Some(parent) = parent {
            state.parents.entry(id).or_default().push(parent);
        }
        self
    }

    /// Sets the record returned by `/api/v1/user`.
    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.state_mut().user = Some(user);
        self
    }

    /// Caps the number of records returned per batch query.
    #[must_use]
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.state_mut().page_limit = Some(limit);
        self
    }

    /// Makes every request with this method and exact path fail.
    #[must_use]
    pub fn with_fault(mut self, method: Method, path: impl Into<String>, fault: Fault) -> Self {
        self.state_mut().faults.push((method, path.into(), fault));
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend lock poisoned")
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().log.clone()
    }

    /// Counts received requests with this method whose path starts with `prefix`.
    #[must_use]
    pub fn count(&self, method: Method, prefix: &str) -> usize {
        self.lock().log.iter().filter(|r| r.method == method && r.path.starts_with(prefix)).count()
    }

    /// Forgets the request log.
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Returns the current parents of `id`, in relation order.
    #[must_use]
    pub fn parents_of(&self, id: TaskId) -> Vec<TaskId> {
        self.lock().parents.get(&id).cloned().unwrap_or_default()
    }

    /// Returns the rendered record for `id`.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Value> {
        let state = self.lock();
        state.tasks.get(&id).map(|_| state.render(id))
    }

    fn handle(&self, request: ApiRequest) -> Result<ApiResponse, BoxError> {
        let mut state = self.lock();
        state.log.push(request.clone());

        let fault = state
            .faults
            .iter()
            .find(|(method, path, _)| *method == request.method && *path == request.path)
            .map(|(_, _, fault)| *fault);
        match fault {
            Some(Fault::Transport) => {
                return Err(format!("connection failed: {} {}", request.method, request.path).into())
            }
            Some(Fault::Status(status)) => return Ok(ApiResponse { status, body: Value::Null }),
            None => {}
        }

        let segments: Vec<&str> =
            request.path.trim_start_matches("/api/v1/").split('/').collect();
        let response = match (request.method, segments.as_slice()) {
            (Method::Get, ["user"]) => match &state.user {
                Some(user) => ApiResponse::ok(user.clone()),
                None => not_found(),
            },
            (Method::Get, ["tasks", "all"]) => state.batch(&request),
            (Method::Post, ["tasks", "bulk"]) => state.bulk(&request),
            (Method::Post, ["tasks", id]) => match id.parse() {
                Ok(id) => state.update(id, &request),
                Err(_) => bad_request(),
            },
            (Method::Put, ["tasks", id, "relations"]) => match id.parse() {
                Ok(id) => state.add_relation(id, &request),
                Err(_) => bad_request(),
            },
            (Method::Delete, ["tasks", id, "relations", "parenttask", parent]) => {
                match (id.parse(), parent.parse()) {
                    (Ok(id), Ok(parent)) => state.remove_relation(id, parent),
                    _ => bad_request(),
                }
            }
            _ => not_found(),
        };
        Ok(response)
    }
}

fn not_found() -> ApiResponse {
    ApiResponse { status: 404, body: json!({"message": "not found"}) }
}

fn bad_request() -> ApiResponse {
    ApiResponse { status: 400, body: json!({"message": "bad request"}) }
}

impl BackendState {
    fn render(&self, id: TaskId) -> Value {
        let mut record = self.tasks.get(&id).cloned().unwrap_or_default();
        let parents: Vec<Value> = self
            .parents
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|pid| self.tasks.get(pid))
            .map(|p| json!({"id": p["id"], "project_id": p["project_id"], "title": p["title"]}))
            .collect();
        record.insert("related_tasks".into(), json!({ "parenttask": parents }));
        Value::Object(record)
    }

    fn batch(&self, request: &ApiRequest) -> ApiResponse {
        let Some(ids) = request.query_value("filter").and_then(parse_id_filter) else {
            return bad_request();
        };
        let mut found: Vec<Value> = Vec::new();
        for id in ids {
            if self.tasks.contains_key(&id) && !found.iter().any(|t| t["id"] == json!(id)) {
                found.push(self.render(id));
            }
        }
        if let Some(limit) = self.page_limit {
            found.truncate(limit);
        }
        ApiResponse::ok(Value::Array(found))
    }

    fn update(&mut self, id: TaskId, request: &ApiRequest) -> ApiResponse {
        let Some(Value::Object(body)) = &request.body else {
            return bad_request();
        };
        let Some(record) = self.tasks.get_mut(&id) else {
            return not_found();
        };
        for (key, value) in body {
            if key != "id" && key != "related_tasks" {
                record.insert(key.clone(), value.clone());
            }
        }
        ApiResponse::ok(self.render(id))
    }

    fn bulk(&mut self, request: &ApiRequest) -> ApiResponse {
        let Some(Value::Object(body)) = &request.body else {
            return bad_request();
        };
        let ids: Vec<TaskId> = body
            .get("task_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        for id in &ids {
            if let Some(record) = self.tasks.get_mut(id) {
                for (key, value) in body {
                    if key != "task_ids" && key != "id" && key != "related_tasks" {
                        record.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        ApiResponse::ok(Value::Array(ids.iter().map(|id| self.render(*id)).collect()))
    }

    fn add_relation(&mut self, id: TaskId, request: &ApiRequest) -> ApiResponse {
        let body = request.body.as_ref();
        let kind = body.and_then(|b| b.get("relation_kind")).and_then(Value::as_str);
        let other = body.and_then(|b| b.get("other_task_id")).and_then(Value::as_i64);
        let (Some("parenttask"), Some(other)) = (kind, other) else {
            return bad_request();
        };
        if !self.tasks.contains_key(&id) || !self.tasks.contains_key(&other) {
            return not_found();
        }
        let parents = self.parents.entry(id).or_default();
        if parents.contains(&other) {
            return ApiResponse { status: 409, body: json!({"message": "relation exists"}) };
        }
        parents.push(other);
        ApiResponse::ok(json!({"task_id": id, "other_task_id": other, "relation_kind": "parenttask"}))
    }

    fn remove_relation(&mut self, id: TaskId, parent: TaskId) -> ApiResponse {
        let Some(parents) = self.parents.get_mut(&id) else {
            return not_found();
        };
        let before = parents.len();
        parents.retain(|p| *p != parent);
        if parents.len() == before {
            return not_found();
        }
        ApiResponse::ok(json!({"message": "deleted"}))
    }
}

/// Parses a filter of the form `id in 1,2,3`.
fn parse_id_filter(filter: &str) -> Option<Vec<TaskId>> {
    let list = filter.trim().strip_prefix("id in")?;
    list.split(',').map(|id| id.trim().parse().ok()).collect()
}

impl Transport for MemoryBackend {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        let result = self.handle(request);
        Box::pin(async move { result })
    }
}
