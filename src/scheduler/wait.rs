//! Release rounds and the three wait operations.

use std::cell::Cell;
use std::future::Future;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_lite::future::{BoxedLocal, poll_fn};
use pin_project::pin_project;
use serde_json::Value;

use super::act::ActHook;
use super::state::{Core, PendingTask};
use super::yield_now::yield_now;
use crate::error::{Result, SchedulerError};
use crate::tracing_compat::{trace, warn};
use crate::types::{Settlement, TaskId, TaskView};

/// Per wait-operation guard over the executor seal.
///
/// Captures the ambient task driving the wait operation. Dropping the guard
/// (the operation finished or was abandoned) lifts the seal it may hold.
struct Round<'a> {
    core: &'a Core,
    owner: Option<usize>,
}

impl<'a> Round<'a> {
    fn enter(core: &'a Core) -> Self {
        Self {
            core,
            owner: core.exec.current(),
        }
    }

    fn seal(&self) {
        if let Some(owner) = self.owner {
            self.core.exec.seal(owner);
        }
    }

    /// Wraps a future that may block the wait operation.
    fn unsealing<F: Future>(&self, inner: F) -> Unsealing<'a, F> {
        Unsealing {
            core: self.core,
            owner: self.owner,
            inner,
        }
    }

    /// Releases one task: select, run under the act hook, record, then give
    /// its direct continuations one pass.
    ///
    /// Returns `None` if nothing was pending once the release lock was held.
    async fn release_one(&self, act: Option<&ActHook>) -> Result<Option<TaskId>> {
        let core = self.core;
        let _lock = self.unsealing(core.acquire()).await;
        let Some(PendingTask {
            view,
            metadata,
            release,
        }) = core.select_next()?
        else {
            return Ok(None);
        };

        let mut in_flight = InFlight {
            core,
            task: Some((view.clone(), metadata.clone())),
        };

        let settled: Rc<Cell<Option<Settlement>>> = Rc::default();
        let sink = Rc::clone(&settled);
        let body: BoxedLocal<()> = Box::pin(async move {
            sink.set(Some(release().await));
        });
        match act.or_else(|| core.act()) {
            Some(hook) => self.unsealing(hook.run(body)).await,
            None => self.unsealing(body).await,
        }

        in_flight.land();
        let id = view.id;
        match settled.take() {
            Some(settlement) => core.record(view, metadata, settlement),
            None => warn!(task = %id, "act hook returned without running the release"),
        }

        self.seal();
        yield_now().await;
        trace!(task = %id, "continuation pass done");
        Ok(Some(id))
    }
}

impl Drop for Round<'_> {
    fn drop(&mut self) {
        if let Some(owner) = self.owner {
            self.core.exec.unseal(owner);
        }
    }
}

/// A selected task whose release has not settled yet.
///
/// Dropped without [`land`](Self::land) (the wait operation was abandoned
/// mid-release), it leaves a pending record so the task stays in the report.
struct InFlight<'a> {
    core: &'a Core,
    task: Option<(TaskView, Option<Value>)>,
}

impl InFlight<'_> {
    fn land(&mut self) {
        self.task = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some((view, metadata)) = self.task.take() {
            self.core.abandon(view, metadata);
        }
    }
}

/// Lifts the seal whenever the wrapped future blocks.
#[pin_project]
struct Unsealing<'a, F> {
    core: &'a Core,
    owner: Option<usize>,
    #[pin]
    inner: F,
}

impl<F: Future> Future for Unsealing<'_, F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let this = self.project();
        let poll = this.inner.poll(cx);
        if poll.is_pending() {
            if let Some(owner) = *this.owner {
                this.core.exec.unseal(owner);
            }
        }
        poll
    }
}

pub(crate) async fn wait_one(core: &Core, act: Option<&ActHook>) -> Result<()> {
    if core.count() == 0 {
        return Err(SchedulerError::NoPendingTask);
    }
    let round = Round::enter(core);
    match round.release_one(act).await? {
        Some(_) => Ok(()),
        // Drained by a concurrent waiter while this one queued for the lock.
        None => Err(SchedulerError::NoPendingTask),
    }
}

pub(crate) async fn wait_all(core: &Core, act: Option<&ActHook>) -> Result<()> {
    let round = Round::enter(core);
    while core.count() > 0 {
        round.release_one(act).await?;
    }
    Ok(())
}

pub(crate) async fn wait_for<F: Future>(
    core: &Core,
    target: F,
    act: Option<&ActHook>,
) -> Result<F::Output> {
    let round = Round::enter(core);
    let mut target = pin!(target);
    loop {
        // Ready(Some): target done. Ready(None): something to release.
        let step = round
            .unsealing(poll_fn(|cx| match target.as_mut().poll(cx) {
                Poll::Ready(output) => Poll::Ready(Some(output)),
                Poll::Pending if core.count() > 0 => Poll::Ready(None),
                Poll::Pending => {
                    core.arm_signal(cx.waker());
                    Poll::Pending
                }
            }))
            .await;
        match step {
            Some(output) => return Ok(output),
            None => {
                round.release_one(act).await?;
            }
        }
    }
}
