//! Core types for the scheduler.
//!
//! - [`TaskId`]: registration-ordered task identity
//! - [`TaskKind`] / [`TaskStatus`]: report vocabulary
//! - [`TaskOptions`]: label and metadata supplied at registration
//! - [`TaskView`]: what an ordering strategy sees of a pending task

pub mod id;
pub mod task;

pub use id::TaskId;
pub(crate) use task::Settlement;
pub use task::{TaskKind, TaskOptions, TaskStatus, TaskView};
