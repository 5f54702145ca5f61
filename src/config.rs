//! Client configuration for the live backend.

use crate::error::{Error, Result};

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the task backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://tasks.example.com`.
    pub base_url: String,
    /// Bearer token for the logged-in user.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Builds a config from already-resolved values.
    ///
    /// Flags and environment variables are merged by the CLI parser before
    /// this is called; this only validates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL or token is missing or blank, the
    /// URL is not http(s), or the timeout is zero.
    pub fn new(base_url: Option<&str>, token: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config("no backend URL; pass --url or set TASKTREE_URL".into()))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!("backend URL must start with http:// or https://, got {base_url}")));
        }
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Config("no API token; pass --token or set TASKTREE_TOKEN".into()))?;
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least one second".into()));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout_secs,
        })
    }
}

/// Loads `.env` from the working directory or its parents, if present.
///
/// Variables already set in the process environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(%err, "ignoring unreadable .env"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_defaults() {
        let config = ClientConfig::new(Some(" https://tasks.example.com/ "), Some("abc"), None).unwrap();
        assert_eq!(config.base_url, "https://tasks.example.com");
        assert_eq!(config.token, "abc");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn missing_url_is_config_error() {
        let err = ClientConfig::new(None, Some("abc"), None).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("TASKTREE_URL")));
    }

    #[test]
    fn blank_token_is_config_error() {
        let err = ClientConfig::new(Some("http://localhost:3456"), Some("  "), None).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("TASKTREE_TOKEN")));
    }

    #[test]
    fn rejects_non_http_url_and_zero_timeout() {
        assert!(ClientConfig::new(Some("ftp://x"), Some("t"), None).is_err());
        assert!(ClientConfig::new(Some("http://x"), Some("t"), Some(0)).is_err());
    }
}
