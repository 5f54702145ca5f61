//! Domain types shared by the cache, hierarchy and drag modules.

mod task;
mod user;

pub use task::{ParentRef, ProjectId, Task, TaskId};
pub use user::{User, UserSettings};
