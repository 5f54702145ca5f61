//! Adapter implementations for port traits.
//!
//! - `live`: sends requests to a real backend over HTTP
//! - `recording`: wraps another transport and records every exchange
//! - `replaying`: serves recorded exchanges from a cassette
//! - `memory`: an in-process backend and row table

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
