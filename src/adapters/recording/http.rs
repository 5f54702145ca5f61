//! Recording adapter for the `Transport` port.

use std::sync::{Arc, Mutex};

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{ApiRequest, Transport, TransportFuture};

/// Records every exchange while delegating to an inner transport.
pub struct RecordingTransport {
    inner: Arc<dyn Transport>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTransport {
    /// Creates a recording transport wrapping the given implementation.
    pub fn new(inner: Arc<dyn Transport>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let result = self.inner.send(request.clone()).await;
            self.recorder.lock().expect("recorder lock poisoned").record(request, &result);
            result
        })
    }
}
