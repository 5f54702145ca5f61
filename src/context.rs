//! Service context bundling the transport a command talks through.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::LiveTransport;
use crate::adapters::recording::RecordingTransport;
use crate::adapters::replaying::ReplayingTransport;
use crate::api::TaskApi;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::ClientConfig;
use crate::ports::Transport;

/// Bundles the transport port with an optional cassette recorder.
///
/// Constructors wire up different adapter implementations (live, replaying,
/// recording). A recording context writes its cassette when dropped.
pub struct ServiceContext {
    /// Transport every request goes through.
    pub transport: Arc<dyn Transport>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context talking to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &ClientConfig) -> Result<Self, String> {
        let transport = LiveTransport::new(config).map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Creates a live context that records every exchange to `path`.
    ///
    /// The cassette is written when this context is dropped. This is the
    /// developer-only mechanism behind the `TASKTREE_RECORD` env var.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn recording(config: &ClientConfig, path: &Path) -> Result<Self, String> {
        let live = LiveTransport::new(config).map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "tasktree-session", &config.base_url)));
        let transport = RecordingTransport::new(Arc::new(live), Arc::clone(&recorder));
        Ok(Self { transport: Arc::new(transport), recorder: Some(recorder) })
    }

    /// Creates a context that serves responses from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let transport = ReplayingTransport::from_path(path).map_err(|e| e.to_string())?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Wraps an arbitrary transport, e.g. an in-memory backend.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport, recorder: None }
    }

    /// An endpoint client over this context's transport.
    #[must_use]
    pub fn api(&self) -> TaskApi {
        TaskApi::new(Arc::clone(&self.transport))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let guard = recorder.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.finish() {
            Ok(path) => eprintln!("Recording saved to: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to write cassette: {e}"),
        }
    }
}
