//! In-process adapters: a task backend and a row table held in memory.

pub mod backend;
pub mod table;

pub use backend::{Fault, MemoryBackend};
pub use table::{MemoryRow, MemoryTable};
