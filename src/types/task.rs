//! Task-level value types: kinds, statuses, registration options.

use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TaskId;
use crate::report::render_value;

/// How a task entered the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// A bare deferred computation handed to [`Scheduler::schedule`](crate::Scheduler::schedule).
    Promise,
    /// One invocation of a function wrapped by
    /// [`Scheduler::schedule_function`](crate::Scheduler::schedule_function).
    Function,
    /// One step of a chain registered by
    /// [`Scheduler::schedule_sequence`](crate::Scheduler::schedule_sequence).
    Sequence,
}

impl TaskKind {
    /// Returns the name used in the textual report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::Function => "function",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a task stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Released and completed successfully.
    Resolved,
    /// Released and failed.
    Rejected,
    /// Registered, not yet released.
    Pending,
}

impl TaskStatus {
    /// Returns the name used in the textual report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
            Self::Pending => "pending",
        }
    }

    /// Returns true once the task has been released and settled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional label and metadata attached to a task at registration.
///
/// ```
/// use schedlab::TaskOptions;
///
/// let options = TaskOptions::new()
///     .label("fetch user")
///     .metadata(serde_json::json!({ "user": 7 }));
/// assert_eq!(options.label_str(), "fetch user");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOptions {
    label: Option<String>,
    metadata: Option<Value>,
}

impl TaskOptions {
    /// Creates empty options (no label, no metadata).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches an opaque payload carried untouched into the report.
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the label, or the empty string when none was set.
    #[must_use]
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    pub(crate) fn into_parts(self) -> (String, Option<Value>) {
        (self.label.unwrap_or_default(), self.metadata)
    }
}

/// What an ordering strategy sees of a pending task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// Task identity.
    pub id: TaskId,
    /// How the task was registered.
    pub kind: TaskKind,
    /// Display label (possibly empty).
    pub label: String,
}

/// Outcome of one released task, rendered for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settlement {
    pub(crate) status: TaskStatus,
    pub(crate) output: Option<String>,
}

impl Settlement {
    pub(crate) fn of<T: fmt::Debug, E: fmt::Debug>(result: &Result<T, E>) -> Self {
        match result {
            Ok(value) => Self {
                status: TaskStatus::Resolved,
                output: render_value(value),
            },
            Err(error) => Self {
                status: TaskStatus::Rejected,
                output: render_value(error),
            },
        }
    }

    pub(crate) const fn is_rejected(&self) -> bool {
        matches!(self.status, TaskStatus::Rejected)
    }
}
