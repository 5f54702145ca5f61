//! Replaying adapters that serve recorded exchanges.

pub mod http;

pub use http::ReplayingTransport;
