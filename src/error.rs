//! Error types for `tasktree`.

use thiserror::Error;

/// Boxed error returned across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for cache, hierarchy and drag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never completed (network, timeout, host transport failure).
    #[error("Transport error on {method} {path}: {source}")]
    Transport {
        /// HTTP method of the failed request.
        method: String,
        /// Request path.
        path: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The backend answered with a non-success status.
    #[error("{method} {path} returned status {status}")]
    Status {
        /// HTTP method of the rejected request.
        method: String,
        /// Request path.
        path: String,
        /// Status code returned by the backend.
        status: u16,
    },

    /// A response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Missing or invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A cassette could not be loaded or written.
    #[error("Cassette error: {0}")]
    Replay(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_request() {
        let err = Error::Status { method: "PUT".into(), path: "/api/v1/tasks/4/relations".into(), status: 409 };
        assert_eq!(err.to_string(), "PUT /api/v1/tasks/4/relations returned status 409");
    }

    #[test]
    fn transport_error_keeps_source() {
        let err = Error::Transport {
            method: "GET".into(),
            path: "/api/v1/user".into(),
            source: "connection reset".into(),
        };
        assert!(err.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
