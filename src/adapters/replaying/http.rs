//! Replaying adapter for the `Transport` port.

use std::path::Path;
use std::sync::Mutex;

use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::{BoxError, Error};
use crate::ports::{ApiRequest, ApiResponse, Transport, TransportFuture};

/// Serves recorded responses from a cassette.
pub struct ReplayingTransport {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingTransport {
    /// Creates a replaying transport from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        Self { replayer: Mutex::new(CassetteReplayer::new(cassette)) }
    }

    /// Loads a cassette file and replays it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Replay(format!("Failed to read cassette {}: {e}", path.display())))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| Error::Replay(format!("Failed to parse cassette {}: {e}", path.display())))?;
        Ok(Self::new(&cassette))
    }

    fn replay(&self, request: &ApiRequest) -> Result<ApiResponse, BoxError> {
        let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
        let interaction = replayer.next_interaction(request.method, &request.path)?;
        match (&interaction.response, &interaction.error) {
            (Some(response), _) => Ok(response.clone()),
            (None, Some(error)) => Err(error.clone().into()),
            (None, None) => Err(format!("Interaction seq={} has no outcome", interaction.seq).into()),
        }
    }
}

impl Transport for ReplayingTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        let result = self.replay(&request);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use crate::ports::Method;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn replays_responses_and_errors() {
        let cassette = Cassette {
            name: "t".into(),
            recorded_at: Utc::now(),
            base_url: "http://localhost".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    request: ApiRequest::new(Method::Get, "/api/v1/user"),
                    response: Some(ApiResponse::ok(json!({"id": 1, "username": "ada"}))),
                    error: None,
                },
                Interaction {
                    seq: 1,
                    request: ApiRequest::new(Method::Get, "/api/v1/user"),
                    response: None,
                    error: Some("connection refused".into()),
                },
            ],
        };
        let transport = ReplayingTransport::new(&cassette);
        let ok = transport.send(ApiRequest::new(Method::Get, "/api/v1/user")).await.unwrap();
        assert_eq!(ok.body["username"], json!("ada"));
        let err = transport.send(ApiRequest::new(Method::Get, "/api/v1/user")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(transport.send(ApiRequest::new(Method::Get, "/api/v1/user")).await.is_err());
    }

    #[test]
    fn missing_file_is_a_replay_error() {
        let result = ReplayingTransport::from_path(Path::new("/nonexistent/cassette.yaml"));
        assert!(matches!(result, Err(Error::Replay(_))));
    }
}
