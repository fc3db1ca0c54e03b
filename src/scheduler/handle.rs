//! Handles returned to the code under test.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::types::TaskId;

enum SlotState<T> {
    Empty(Option<Waker>),
    Filled(T),
    Taken,
}

/// One-shot value cell shared between a producer and a single awaiter.
pub(crate) struct Slot<T> {
    state: RefCell<SlotState<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(SlotState::Empty(None)),
        })
    }

    /// Stores the value and wakes the awaiter, if any.
    pub(crate) fn fill(&self, value: T) {
        let previous = self.state.replace(SlotState::Filled(value));
        if let SlotState::Empty(Some(waker)) = previous {
            waker.wake();
        }
    }

    pub(crate) fn is_filled(&self) -> bool {
        !matches!(*self.state.borrow(), SlotState::Empty(_))
    }

    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Filled(value) => Poll::Ready(value),
            SlotState::Empty(_) => {
                *state = SlotState::Empty(Some(cx.waker().clone()));
                Poll::Pending
            }
            // Polled after completion: never resolves again.
            SlotState::Taken => Poll::Pending,
        }
    }
}

/// Deferred result of a scheduled computation.
///
/// Resolves with the computation's `Result` once the scheduler has released
/// it and it has run to completion. Dropping the handle does not cancel the
/// task; it still counts as pending until released.
#[must_use = "a scheduled task's result is only observable through its handle"]
pub struct Scheduled<T, E> {
    id: TaskId,
    slot: Rc<Slot<Result<T, E>>>,
}

impl<T, E> Scheduled<T, E> {
    pub(crate) fn new(id: TaskId, slot: Rc<Slot<Result<T, E>>>) -> Self {
        Self { id, slot }
    }

    /// Id of the underlying task.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns true once the task was released and settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.is_filled()
    }
}

impl<T, E> Future for Scheduled<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.slot.poll_take(cx)
    }
}

impl<T, E> std::fmt::Debug for Scheduled<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduled")
            .field("id", &self.id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Output of an ambient task started with [`Scheduler::spawn`](crate::Scheduler::spawn).
#[must_use = "dropping a JoinHandle detaches the task"]
pub struct JoinHandle<T> {
    slot: Rc<Slot<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(slot: Rc<Slot<T>>) -> Self {
        Self { slot }
    }

    /// Returns true once the task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.is_filled()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        self.slot.poll_take(cx)
    }
}

impl<T> std::fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
