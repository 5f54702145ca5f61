//! Recording adapters that capture exchanges to cassettes.

pub mod http;

pub use http::RecordingTransport;
