//! Strictly ordered chains of steps.
//!
//! Only the head of a chain is ever pending. Step `k + 1` is registered from
//! inside step `k`'s release, after `k` succeeded, so two steps of one chain
//! can never be in flight together while unrelated tasks still interleave
//! between them.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use futures_lite::future::BoxedLocal;
use serde::Serialize;
use serde_json::Value;

use super::state::{Core, Release};
use crate::types::{Settlement, TaskKind};

/// One link of a sequence: a label plus a builder for its computation.
pub struct SequenceStep {
    label: String,
    metadata: Option<Value>,
    run: Release,
}

impl SequenceStep {
    /// Creates a step. `builder` is invoked only when the step is released.
    pub fn new<B, Fut, T, E>(label: impl Into<String>, builder: B) -> Self
    where
        B: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        T: Debug,
        E: Debug,
    {
        Self {
            label: label.into(),
            metadata: None,
            run: Box::new(move || -> BoxedLocal<Settlement> {
                Box::pin(async move { Settlement::of(&builder().await) })
            }),
        }
    }

    /// Attaches an opaque payload carried into the report.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl fmt::Debug for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceStep")
            .field("label", &self.label)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Terminal state of a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SequenceOutcome {
    /// Every step completed, in order.
    pub done: bool,
    /// Some step failed; later steps never ran.
    pub faulty: bool,
}

#[derive(Default)]
struct Progress {
    outcome: Cell<SequenceOutcome>,
    finished: Cell<bool>,
    waiters: RefCell<Vec<Waker>>,
}

impl Progress {
    fn finish(&self, outcome: SequenceOutcome) {
        self.outcome.set(outcome);
        self.finished.set(true);
        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }
}

/// Live view of a scheduled sequence.
#[derive(Clone)]
pub struct SequenceHandle {
    progress: Rc<Progress>,
}

impl SequenceHandle {
    /// True once every step completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.progress.outcome.get().done
    }

    /// True as soon as a step failed.
    #[must_use]
    pub fn is_faulty(&self) -> bool {
        self.progress.outcome.get().faulty
    }

    /// Future resolving to the terminal outcome.
    pub fn task(&self) -> SequenceTask {
        SequenceTask {
            progress: Rc::clone(&self.progress),
        }
    }
}

impl fmt::Debug for SequenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceHandle")
            .field("done", &self.is_done())
            .field("faulty", &self.is_faulty())
            .finish()
    }
}

/// Resolves once the sequence is done or faulty.
#[must_use = "futures do nothing unless awaited"]
pub struct SequenceTask {
    progress: Rc<Progress>,
}

impl Future for SequenceTask {
    type Output = SequenceOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SequenceOutcome> {
        if self.progress.finished.get() {
            return Poll::Ready(self.progress.outcome.get());
        }
        let mut waiters = self.progress.waiters.borrow_mut();
        if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
            waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl fmt::Debug for SequenceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceTask")
            .field("finished", &self.progress.finished.get())
            .finish()
    }
}

pub(crate) fn start(
    core: &Rc<Core>,
    steps: impl IntoIterator<Item = SequenceStep>,
) -> SequenceHandle {
    let progress = Rc::new(Progress::default());
    advance(Rc::downgrade(core), steps.into_iter().collect(), Rc::clone(&progress));
    SequenceHandle { progress }
}

/// Registers the head of `steps`, or finishes the sequence when none remain.
fn advance(core: Weak<Core>, mut steps: VecDeque<SequenceStep>, progress: Rc<Progress>) {
    let Some(SequenceStep {
        label,
        metadata,
        run,
    }) = steps.pop_front()
    else {
        progress.finish(SequenceOutcome {
            done: true,
            faulty: false,
        });
        return;
    };
    let Some(registry) = core.upgrade() else {
        return;
    };
    let release: Release = Box::new(move || {
        Box::pin(async move {
            let settled = run().await;
            if settled.is_rejected() {
                progress.finish(SequenceOutcome {
                    done: false,
                    faulty: true,
                });
            } else {
                advance(core, steps, progress);
            }
            settled
        })
    });
    registry.register(TaskKind::Sequence, label, metadata, release);
}
