//! Live adapter for the `Transport` port using `reqwest`.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::BoxError;
use crate::ports::{ApiRequest, ApiResponse, Method, Transport, TransportFuture};

/// Sends requests to a real backend with a bearer token.
pub struct LiveTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl LiveTransport {
    /// Creates a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, BoxError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Transport for LiveTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let url = self.url(&request.path);
            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
                Method::Put => self.client.put(&url),
                Method::Delete => self.client.delete(&url),
            };
            builder = builder.bearer_auth(&self.token);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| -> BoxError {
                format!("{} {url} failed: {e}", request.method).into()
            })?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| -> BoxError {
                format!("Failed to read response from {url}: {e}").into()
            })?;

            let body = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };
            Ok(ApiResponse { status, body })
        })
    }
}
