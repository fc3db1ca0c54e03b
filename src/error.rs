//! Error types for the scheduler.
//!
//! Only scheduler-internal invariant violations are errors. A released task
//! that fails is *data*: it is recorded as a rejected trigger and handed to
//! whoever awaits that task, and the scheduler keeps servicing the rest.
//!
//! # Error Categories
//!
//! - **Caller misuse**: [`SchedulerError::NoPendingTask`], [`SchedulerError::Reentrant`]
//! - **Replay mismatch**: [`SchedulerError::UnknownTaskRequested`],
//!   [`SchedulerError::SequenceExhausted`]
//! - **Strategy bug**: [`SchedulerError::IndexOutOfRange`]
//! - **Executor**: [`SchedulerError::Stalled`]
//! - **Input**: [`SchedulerError::MalformedReport`], [`SchedulerError::Config`]

use thiserror::Error;

use crate::types::TaskId;

/// Errors surfaced by scheduler operations.
///
/// None of these are retried or recovered internally; each is fatal to the
/// wait operation that observed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// `wait_one` was called while nothing was pending.
    #[error("no pending task to release")]
    NoPendingTask,

    /// The replay strategy asked for a task that is not pending.
    #[error("replay requested task {id} but pending tasks are {pending:?}")]
    UnknownTaskRequested {
        /// Id the recorded sequence asked for.
        id: TaskId,
        /// Ids that were actually pending, in pending order.
        pending: Vec<TaskId>,
    },

    /// The replay strategy was asked for more decisions than were recorded.
    #[error("replay sequence exhausted after {recorded} recorded decisions")]
    SequenceExhausted {
        /// Number of recorded decisions.
        recorded: usize,
    },

    /// An ordering strategy returned an index outside the pending list.
    #[error("ordering strategy picked index {index} among {pending} pending tasks")]
    IndexOutOfRange {
        /// Index returned by the strategy.
        index: usize,
        /// Length of the pending list it was given.
        pending: usize,
    },

    /// The executor ran out of runnable work before the driven future completed.
    #[error("executor stalled with {pending} scheduled tasks still pending")]
    Stalled {
        /// Number of scheduled tasks never released.
        pending: usize,
    },

    /// `block_on` or `run_until_stalled` was called from inside the executor.
    #[error("executor is already running")]
    Reentrant,

    /// A textual report could not be parsed back into a replay sequence.
    #[error("malformed report line {line}: {reason}")]
    MalformedReport {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SchedulerError {
    /// Returns true if a recorded replay no longer matches the program under test.
    #[must_use]
    pub const fn is_replay_mismatch(&self) -> bool {
        matches!(
            self,
            Self::UnknownTaskRequested { .. } | Self::SequenceExhausted { .. }
        )
    }

    /// Creates a malformed-report error.
    #[must_use]
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
