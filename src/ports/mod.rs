//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the task cache core and an
//! external system (the backend transport, the rendered table).
//! Implementations live in `src/adapters/`.

pub mod table;
pub mod transport;

pub use table::{RowKey, RowTable};
pub use transport::{ApiRequest, ApiResponse, Method, Transport, TransportFuture};
