//! The scheduler: registration, release, and the executor driving it all.
//!
//! # Model
//!
//! Every computation handed to [`Scheduler::schedule`] (or produced by a
//! [`ScheduledFn`] call or a sequence step) becomes a *pending task*: an owned,
//! not yet polled future. It makes no progress until a wait operation asks the
//! [`TaskSelector`](crate::TaskSelector) which pending task goes next and
//! releases it. Releasing means polling the computation to completion, handing
//! its `Result` to whoever holds the [`Scheduled`] handle, and appending a
//! trigger record to the report.
//!
//! The code under test runs as ambient tasks on the scheduler's own
//! single-threaded executor ([`Scheduler::spawn`], [`Scheduler::block_on`]).
//! After each release the executor gives direct continuations of the settled
//! task one pass before the next release decision: a task registered by such
//! a continuation is seen by the same wait operation, one registered after
//! the continuation's next suspension point is not.
//!
//! ```
//! use schedlab::{FifoSelector, Scheduler, yield_now};
//! use std::convert::Infallible;
//!
//! let s = Scheduler::with_selector(FifoSelector);
//! let p1 = s.schedule(async { Ok::<_, Infallible>("p1") });
//! let _p2 = s.schedule(async { Ok::<_, Infallible>("p2") });
//!
//! let s2 = s.clone();
//! let _late = s.spawn(async move {
//!     let _ = p1.await;
//!     yield_now().await;
//!     s2.schedule(async { Ok::<_, Infallible>("p3") })
//! });
//!
//! s.block_on(s.wait_all()).unwrap().unwrap();
//! assert_eq!(s.count(), 0);
//! s.run_until_stalled().unwrap();
//! assert_eq!(s.count(), 1);
//! ```

mod act;
mod executor;
mod function;
mod handle;
mod sequence;
mod state;
mod wait;
mod yield_now;

use std::fmt::{self, Debug};
use std::future::Future;
use std::rc::Rc;

use serde_json::Value;

use self::state::{Core, Release};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::report::{ReportEntry, render_report};
use crate::selector::TaskSelector;
use crate::tracing_compat::debug;
use crate::types::{Settlement, TaskId, TaskKind, TaskOptions, TaskView};

pub use act::ActHook;
pub use function::{CallArgs, ScheduledFn};
pub use handle::{JoinHandle, Scheduled};
pub use sequence::{SequenceHandle, SequenceOutcome, SequenceStep, SequenceTask};
pub use yield_now::{YieldNow, yield_now};

/// Deterministic scheduler for asynchronous tasks.
///
/// Cloning yields another handle to the *same* scheduler, so the code under
/// test and the driver can share it. Use [`fresh`](Self::fresh) for an
/// independent scheduler with the same configuration.
#[derive(Clone)]
pub struct Scheduler {
    core: Rc<Core>,
}

impl Scheduler {
    /// Scheduler with the default configuration (seeded ordering).
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(SchedulerConfig::default())
    }

    /// Scheduler ordered by `selector`, without an act hook.
    pub fn with_selector(selector: impl TaskSelector + 'static) -> Self {
        Self::from_parts(Box::new(selector), None)
    }

    /// Scheduler ordered by `selector` with an instance-level act hook.
    pub fn with_selector_and_act(selector: impl TaskSelector + 'static, act: ActHook) -> Self {
        Self::from_parts(Box::new(selector), Some(act))
    }

    /// Scheduler built from a configuration.
    #[must_use]
    pub fn from_config(config: SchedulerConfig) -> Self {
        let (selector, act) = config.into_parts();
        Self::from_parts(selector, act)
    }

    pub(crate) fn from_parts(selector: Box<dyn TaskSelector>, act: Option<ActHook>) -> Self {
        debug!(selector = %selector.describe(), act = act.is_some(), "scheduler created");
        Self {
            core: Rc::new(Core::new(selector, act)),
        }
    }

    /// Independent scheduler with the same act hook and a restarted selector.
    ///
    /// Nothing pending or settled carries over: the copy starts with
    /// `count() == 0` and ids from 1, so replaying the same external calls
    /// reproduces the original run.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::from_parts(self.core.restarted_selector(), self.core.act().cloned())
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Registers `computation` as a pending `promise` task.
    pub fn schedule<F, T, E>(&self, computation: F) -> Scheduled<T, E>
    where
        F: Future<Output = std::result::Result<T, E>> + 'static,
        T: Debug + 'static,
        E: Debug + 'static,
    {
        self.schedule_with(computation, TaskOptions::new())
    }

    /// Registers `computation` with a label and/or metadata.
    pub fn schedule_with<F, T, E>(&self, computation: F, options: TaskOptions) -> Scheduled<T, E>
    where
        F: Future<Output = std::result::Result<T, E>> + 'static,
        T: Debug + 'static,
        E: Debug + 'static,
    {
        let (label, metadata) = options.into_parts();
        self.schedule_kind(TaskKind::Promise, label, metadata, computation)
    }

    pub(crate) fn schedule_kind<F, T, E>(
        &self,
        kind: TaskKind,
        label: String,
        metadata: Option<Value>,
        computation: F,
    ) -> Scheduled<T, E>
    where
        F: Future<Output = std::result::Result<T, E>> + 'static,
        T: Debug + 'static,
        E: Debug + 'static,
    {
        let slot = handle::Slot::new();
        let sink = Rc::clone(&slot);
        let release: Release = Box::new(move || {
            Box::pin(async move {
                let output = computation.await;
                let settled = Settlement::of(&output);
                sink.fill(output);
                settled
            })
        });
        let id = self.core.register(kind, label, metadata, release);
        Scheduled::new(id, slot)
    }

    /// Wraps `f` so that each call is scheduled as a `function` task.
    pub fn schedule_function<F>(&self, name: impl AsRef<str>, f: F) -> ScheduledFn<F> {
        ScheduledFn::new(self.clone(), name.as_ref(), f)
    }

    /// Registers a chain of steps released strictly one after another.
    pub fn schedule_sequence(
        &self,
        steps: impl IntoIterator<Item = SequenceStep>,
    ) -> SequenceHandle {
        sequence::start(&self.core, steps)
    }

    // ── Release ─────────────────────────────────────────────────────────

    /// Releases exactly one task and waits for it to settle.
    pub async fn wait_one(&self) -> Result<()> {
        wait::wait_one(&self.core, None).await
    }

    /// [`wait_one`](Self::wait_one) with a per-call act hook.
    pub async fn wait_one_with(&self, act: ActHook) -> Result<()> {
        wait::wait_one(&self.core, Some(&act)).await
    }

    /// Releases tasks until none is pending.
    ///
    /// Tasks registered by a direct continuation of a settled task are
    /// released by the same call.
    pub async fn wait_all(&self) -> Result<()> {
        wait::wait_all(&self.core, None).await
    }

    /// [`wait_all`](Self::wait_all) with a per-call act hook.
    pub async fn wait_all_with(&self, act: ActHook) -> Result<()> {
        wait::wait_all(&self.core, Some(&act)).await
    }

    /// Releases tasks one at a time until `target` completes, then returns
    /// its output. Tasks `target` does not need may remain pending.
    ///
    /// If `target` is blocked and nothing is pending, waits for a new task
    /// to be registered.
    pub async fn wait_for<F: Future>(&self, target: F) -> Result<F::Output> {
        wait::wait_for(&self.core, target, None).await
    }

    /// [`wait_for`](Self::wait_for) with a per-call act hook.
    pub async fn wait_for_with<F: Future>(&self, target: F, act: ActHook) -> Result<F::Output> {
        wait::wait_for(&self.core, target, Some(&act)).await
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Number of pending tasks.
    #[must_use]
    pub fn count(&self) -> usize {
        self.core.count()
    }

    /// Pending tasks, in pending order.
    #[must_use]
    pub fn pending_tasks(&self) -> Vec<TaskView> {
        self.core.pending_views()
    }

    /// Trigger records in settlement order, then pending tasks.
    #[must_use]
    pub fn report(&self) -> Vec<ReportEntry> {
        self.core.report()
    }

    /// The report as a JSON array.
    pub fn report_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    /// The report as a pasteable `scheduler_for!` literal.
    #[must_use]
    pub fn render(&self) -> String {
        render_report(&self.report())
    }

    /// Task ids in report order: what the rendered text replays.
    #[must_use]
    pub fn replay_ids(&self) -> Vec<TaskId> {
        self.report().into_iter().map(|entry| entry.id).collect()
    }

    // ── Executor ────────────────────────────────────────────────────────

    /// Starts an ambient task.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let slot = handle::Slot::new();
        let sink = Rc::clone(&slot);
        self.core.exec.spawn(Box::pin(async move {
            sink.fill(future.await);
        }));
        JoinHandle::new(slot)
    }

    /// Drives `future` and every ambient task until `future` completes.
    ///
    /// Fails with [`Stalled`](crate::SchedulerError::Stalled) when nothing is
    /// runnable before that, and with
    /// [`Reentrant`](crate::SchedulerError::Reentrant) when called from
    /// inside the executor.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output> {
        self.core.exec.block_on(future, || self.core.count())
    }

    /// Polls ambient tasks until none is runnable; returns the number of polls.
    pub fn run_until_stalled(&self) -> Result<usize> {
        self.core.exec.run_until_stalled()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
