//! Cassette data structures for recording and replaying HTTP exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{ApiRequest, ApiResponse};

/// A single recorded request and what came back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// The request as issued.
    pub request: ApiRequest,
    /// The response, when the request completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ApiResponse>,
    /// The transport error, when it did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A cassette containing a sequence of recorded exchanges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Backend the exchanges were recorded against.
    pub base_url: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Method;
    use serde_json::json;

    #[test]
    fn reads_hand_written_yaml() {
        let yaml = r#"
name: hand-written
recorded_at: 2025-03-15T14:30:00Z
base_url: https://tasks.example.com
interactions:
  - seq: 0
    request:
      method: GET
      path: /api/v1/tasks/all
      query:
        - [filter, "id in 1"]
    response:
      status: 200
      body: [{id: 1, project_id: 2}]
  - seq: 1
    request:
      method: DELETE
      path: /api/v1/tasks/1/relations/parenttask/4
    error: connection reset
"#;
        let cassette: Cassette = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(cassette.interactions.len(), 2);
        let first = &cassette.interactions[0];
        assert_eq!(first.request.method, Method::Get);
        assert_eq!(first.request.query_value("filter"), Some("id in 1"));
        assert_eq!(first.response.as_ref().unwrap().body, json!([{"id": 1, "project_id": 2}]));
        assert_eq!(cassette.interactions[1].error.as_deref(), Some("connection reset"));
    }
}
