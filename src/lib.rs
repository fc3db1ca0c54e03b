//! Schedlab: a deterministic, replayable async task scheduler for race hunting.
//!
//! # Overview
//!
//! Schedlab lets a test intercept every asynchronous operation created by the
//! code under test, hold it suspended, and decide which suspended operation is
//! allowed to complete next. Exploring different completion orders turns
//! non-deterministic race conditions into deterministic, shrinkable and
//! reproducible failures.
//!
//! # Core Guarantees
//!
//! - **Single in-flight release**: at most one task is released and settling
//!   at any time, even with several concurrent waiters
//! - **Controlled order**: the pluggable [`TaskSelector`] is the only thing
//!   deciding which pending task completes next
//! - **Replayable**: a rendered report is a literal that rebuilds the exact
//!   same task-id order through [`scheduler_for!`]
//! - **Continuation pass**: work registered by a direct continuation of a
//!   settled task is visible to the same wait loop; work registered after a
//!   further suspension point is not
//!
//! # Module Structure
//!
//! - [`types`]: Task identifiers, kinds, statuses and registration options
//! - [`scheduler`]: The scheduler, its executor, handles and wait operations
//! - [`selector`]: Ordering strategies (replay, seeded, recorded choices, FIFO)
//! - [`report`]: Trigger records and the textual reproduction format
//! - [`replay`]: Replay-ordering builder and report parsing
//! - [`config`]: Scheduler configuration (builder and environment overrides)
//! - [`error`](mod@error): Error types
//! - [`util`]: Deterministic PRNG
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Quick Start
//!
//! ```
//! use schedlab::{FifoSelector, Scheduler};
//! use std::convert::Infallible;
//!
//! let scheduler = Scheduler::with_selector(FifoSelector);
//! let first = scheduler.schedule(async { Ok::<_, Infallible>(1) });
//! let second = scheduler.schedule(async { Ok::<_, Infallible>(2) });
//!
//! let total = scheduler
//!     .block_on(async {
//!         scheduler.wait_all().await?;
//!         let a = first.await.unwrap_or_default();
//!         let b = second.await.unwrap_or_default();
//!         Ok::<_, schedlab::SchedulerError>(a + b)
//!     })
//!     .and_then(|inner| inner);
//! assert_eq!(total, Ok(3));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod error;
pub mod replay;
pub mod report;
pub mod scheduler;
pub mod selector;
pub mod tracing_compat;
pub mod types;
pub mod util;

#[cfg(feature = "proptest")]
pub mod arbitrary;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use replay::{ReplayBuilder, parse_report_ids};
pub use report::{ReportEntry, render_report, render_value};
pub use scheduler::{
    ActHook, CallArgs, JoinHandle, Scheduled, ScheduledFn, Scheduler, SequenceHandle,
    SequenceOutcome, SequenceStep, SequenceTask, YieldNow, yield_now,
};
pub use selector::{
    ChoiceSelector, FifoSelector, FnSelector, ReplaySelector, SeededSelector, TaskSelector,
};
pub use types::{TaskId, TaskKind, TaskOptions, TaskStatus, TaskView};
