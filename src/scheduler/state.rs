//! Shared scheduler state: pending tasks, history, release lock.

use std::cell::RefCell;
use std::future::Future;
use std::task::{Poll, Waker};

use futures_lite::future::{BoxedLocal, poll_fn};
use serde_json::Value;

use super::act::ActHook;
use super::executor::Executor;
use crate::error::{Result, SchedulerError};
use crate::report::ReportEntry;
use crate::selector::TaskSelector;
use crate::tracing_compat::{debug, trace, warn};
use crate::types::{Settlement, TaskId, TaskKind, TaskStatus, TaskView};

/// Runs a task to completion, delivers its result to the awaiter, and
/// reports how it settled.
pub(crate) type Release = Box<dyn FnOnce() -> BoxedLocal<Settlement>>;

pub(crate) struct PendingTask {
    pub(crate) view: TaskView,
    pub(crate) metadata: Option<Value>,
    pub(crate) release: Release,
}

/// Single-shot "a task was registered" signal for idle waiters.
#[derive(Default)]
struct NewTaskSignal {
    armed: bool,
    waiters: Vec<Waker>,
}

impl NewTaskSignal {
    fn arm(&mut self, waker: &Waker) {
        if !self.waiters.iter().any(|w| w.will_wake(waker)) {
            self.waiters.push(waker.clone());
        }
        self.armed = true;
    }

    fn fire(&mut self) -> Vec<Waker> {
        if !self.armed {
            return Vec::new();
        }
        self.armed = false;
        std::mem::take(&mut self.waiters)
    }
}

#[derive(Default)]
struct ReleaseLock {
    held: bool,
    waiters: Vec<Waker>,
}

struct State {
    next_id: TaskId,
    pending: Vec<PendingTask>,
    history: Vec<ReportEntry>,
    signal: NewTaskSignal,
    lock: ReleaseLock,
}

pub(crate) struct Core {
    state: RefCell<State>,
    selector: RefCell<Box<dyn TaskSelector>>,
    act: Option<ActHook>,
    pub(crate) exec: Executor,
}

impl Core {
    pub(crate) fn new(selector: Box<dyn TaskSelector>, act: Option<ActHook>) -> Self {
        Self {
            state: RefCell::new(State {
                next_id: TaskId::FIRST,
                pending: Vec::new(),
                history: Vec::new(),
                signal: NewTaskSignal::default(),
                lock: ReleaseLock::default(),
            }),
            selector: RefCell::new(selector),
            act,
            exec: Executor::new(),
        }
    }

    pub(crate) fn act(&self) -> Option<&ActHook> {
        self.act.as_ref()
    }

    pub(crate) fn restarted_selector(&self) -> Box<dyn TaskSelector> {
        self.selector.borrow().restart()
    }

    /// Adds a task to the end of the pending list and fires the new-task signal.
    pub(crate) fn register(
        &self,
        kind: TaskKind,
        label: String,
        metadata: Option<Value>,
        release: Release,
    ) -> TaskId {
        let (id, wakers) = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id = id.next();
            state.pending.push(PendingTask {
                view: TaskView { id, kind, label },
                metadata,
                release,
            });
            (id, state.signal.fire())
        };
        debug!(task = %id, %kind, waiters = wakers.len(), "task registered");
        for waker in wakers {
            waker.wake();
        }
        id
    }

    pub(crate) fn count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub(crate) fn pending_views(&self) -> Vec<TaskView> {
        self.state
            .borrow()
            .pending
            .iter()
            .map(|task| task.view.clone())
            .collect()
    }

    /// Asks the selector for the next task and removes it from the pending list.
    ///
    /// Returns `None` when nothing is pending.
    pub(crate) fn select_next(&self) -> Result<Option<PendingTask>> {
        let views = self.pending_views();
        if views.is_empty() {
            return Ok(None);
        }
        let index = self.selector.borrow_mut().next_index(&views)?;
        let Some(chosen) = views.get(index) else {
            return Err(SchedulerError::IndexOutOfRange {
                index,
                pending: views.len(),
            });
        };
        debug!(
            task = %chosen.id,
            index,
            pending = views.len(),
            "release decision"
        );
        let id = chosen.id;
        let mut state = self.state.borrow_mut();
        let position = state
            .pending
            .iter()
            .position(|task| task.view.id == id)
            .unwrap_or(index);
        Ok(Some(state.pending.remove(position)))
    }

    /// Appends a trigger record for a settled task.
    pub(crate) fn record(&self, view: TaskView, metadata: Option<Value>, settled: Settlement) {
        trace!(task = %view.id, status = %settled.status, "task settled");
        self.state.borrow_mut().history.push(ReportEntry {
            id: view.id,
            kind: view.kind,
            label: view.label,
            metadata,
            status: settled.status,
            output: settled.output,
        });
    }

    /// Records a selected task whose release was dropped before it settled.
    ///
    /// It can no longer be released, so it stays in the history as pending.
    pub(crate) fn abandon(&self, view: TaskView, metadata: Option<Value>) {
        warn!(task = %view.id, "release abandoned before settling");
        self.state.borrow_mut().history.push(ReportEntry {
            id: view.id,
            kind: view.kind,
            label: view.label,
            metadata,
            status: TaskStatus::Pending,
            output: None,
        });
    }

    /// Settled records followed by pending tasks.
    pub(crate) fn report(&self) -> Vec<ReportEntry> {
        let state = self.state.borrow();
        let mut entries = state.history.clone();
        entries.extend(state.pending.iter().map(|task| ReportEntry {
            id: task.view.id,
            kind: task.view.kind,
            label: task.view.label.clone(),
            metadata: task.metadata.clone(),
            status: TaskStatus::Pending,
            output: None,
        }));
        entries
    }

    /// Arms the new-task signal for `waker`.
    pub(crate) fn arm_signal(&self, waker: &Waker) {
        self.state.borrow_mut().signal.arm(waker);
    }

    /// Acquires the release lock. Only one release is in flight at a time.
    pub(crate) fn acquire(&self) -> impl Future<Output = LockGuard<'_>> {
        poll_fn(move |cx| {
            let mut state = self.state.borrow_mut();
            if state.lock.held {
                let waker = cx.waker();
                if !state.lock.waiters.iter().any(|w| w.will_wake(waker)) {
                    state.lock.waiters.push(waker.clone());
                }
                Poll::Pending
            } else {
                state.lock.held = true;
                Poll::Ready(LockGuard { core: self })
            }
        })
    }
}

/// Held from release decision until the continuation pass is over.
pub(crate) struct LockGuard<'a> {
    core: &'a Core,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let waiters = {
            let mut state = self.core.state.borrow_mut();
            state.lock.held = false;
            std::mem::take(&mut state.lock.waiters)
        };
        // Every waiter retries; whoever is polled first takes the lock.
        for waker in waiters {
            waker.wake();
        }
    }
}
