//! Single-threaded executor for ambient tasks.
//!
//! Ambient tasks are the code under test: continuations, drivers, anything
//! spawned with [`Scheduler::spawn`](crate::Scheduler::spawn) or driven by
//! [`Scheduler::block_on`](crate::Scheduler::block_on). They are not under
//! ordering control; they run whenever they are woken, in FIFO wake order.
//!
//! # Continuation pass
//!
//! When a wait operation settles a released task it *seals* the executor on
//! behalf of the ambient task driving it and yields once. While sealed:
//!
//! - wakes raised while the sealing task was being polled (the settlement's
//!   own wakes) are runnable as usual;
//! - wakes raised by any other task are parked in a deferred queue.
//!
//! Consecutive release rounds of one wait operation share the seal. It is
//! lifted when the wait operation blocks or finishes (or when nothing else is
//! runnable), and the deferred queue is appended to the ready queue. Net
//! effect: a direct continuation of a settled task runs before the next
//! release decision, and nothing it triggers beyond its first suspension point
//! does.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use futures_lite::future::BoxedLocal;
use parking_lot::Mutex;
use slab::Slab;

use crate::error::{Result, SchedulerError};
use crate::tracing_compat::warn;

type WakeList = Arc<Mutex<Vec<usize>>>;

struct AmbientWaker {
    key: usize,
    woken: WakeList,
}

impl Wake for AmbientWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.woken.lock().push(self.key);
    }
}

#[derive(Debug, Default)]
struct Queues {
    ready: VecDeque<usize>,
    deferred: VecDeque<usize>,
    current: Option<usize>,
    sealed_by: Option<usize>,
    running: bool,
}

impl Queues {
    fn flush_deferred(&mut self) {
        while let Some(key) = self.deferred.pop_front() {
            if !self.ready.contains(&key) {
                self.ready.push_back(key);
            }
        }
    }
}

/// One slot of the task table.
struct Entry {
    // `None` while the task is being polled, or for the `block_on` root.
    future: Option<BoxedLocal<()>>,
    // Reused on every poll so wakers stored by futures compare `will_wake`.
    waker: Waker,
}

/// The ambient task table plus its ready/deferred queues.
pub(crate) struct Executor {
    tasks: RefCell<Slab<Entry>>,
    queues: RefCell<Queues>,
    woken: WakeList,
}

impl Executor {
    pub(crate) fn new() -> Self {
        Self {
            tasks: RefCell::new(Slab::new()),
            queues: RefCell::new(Queues::default()),
            woken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers an ambient task; it becomes runnable immediately.
    pub(crate) fn spawn(&self, future: BoxedLocal<()>) -> usize {
        let key = self.insert(Some(future));
        self.woken.lock().push(key);
        key
    }

    fn insert(&self, future: Option<BoxedLocal<()>>) -> usize {
        let mut tasks = self.tasks.borrow_mut();
        let slot = tasks.vacant_entry();
        let key = slot.key();
        let waker = Waker::from(Arc::new(AmbientWaker {
            key,
            woken: Arc::clone(&self.woken),
        }));
        slot.insert(Entry { future, waker });
        key
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Key of the ambient task currently being polled, if any.
    pub(crate) fn current(&self) -> Option<usize> {
        self.queues.borrow().current
    }

    /// Seals the executor on behalf of ambient task `owner`.
    pub(crate) fn seal(&self, owner: usize) {
        self.queues.borrow_mut().sealed_by = Some(owner);
    }

    /// Lifts the seal if `owner` holds it.
    pub(crate) fn unseal(&self, owner: usize) {
        let mut queues = self.queues.borrow_mut();
        if queues.sealed_by == Some(owner) {
            queues.sealed_by = None;
            queues.flush_deferred();
        }
    }

    /// Moves raised wakes into the ready or deferred queue.
    ///
    /// `source` is the task whose poll raised them.
    fn absorb(&self, source: Option<usize>) {
        let woken = std::mem::take(&mut *self.woken.lock());
        if woken.is_empty() {
            return;
        }
        let mut queues = self.queues.borrow_mut();
        for key in woken {
            let defer = queues
                .sealed_by
                .is_some_and(|owner| source != Some(owner) && key != owner);
            let queue = if defer {
                &mut queues.deferred
            } else {
                &mut queues.ready
            };
            if !queue.contains(&key) {
                queue.push_back(key);
            }
        }
    }

    fn next_ready(&self) -> Option<usize> {
        let mut queues = self.queues.borrow_mut();
        if queues.ready.is_empty() {
            // Nothing left to run under the seal: lift it rather than stall.
            queues.sealed_by = None;
            queues.flush_deferred();
        }
        queues.ready.pop_front()
    }

    /// The cached waker of `key`, or a throwaway one if the slot is gone.
    fn waker_for(&self, key: usize) -> Waker {
        match self.tasks.borrow().get(key) {
            Some(entry) => entry.waker.clone(),
            None => Waker::from(Arc::new(AmbientWaker {
                key,
                woken: Arc::clone(&self.woken),
            })),
        }
    }

    fn enter(&self) -> Result<RunGuard<'_>> {
        let mut queues = self.queues.borrow_mut();
        if queues.running {
            return Err(SchedulerError::Reentrant);
        }
        queues.running = true;
        drop(queues);
        self.absorb(None);
        Ok(RunGuard { exec: self })
    }

    fn poll_with<F: Future + ?Sized>(
        &self,
        key: usize,
        future: Pin<&mut F>,
    ) -> Poll<F::Output> {
        let waker = self.waker_for(key);
        let mut cx = Context::from_waker(&waker);
        let previous = self.queues.borrow_mut().current.replace(key);
        let poll = future.poll(&mut cx);
        self.queues.borrow_mut().current = previous;
        self.absorb(Some(key));
        poll
    }

    fn poll_ambient(&self, key: usize) {
        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(key)
            .and_then(|entry| entry.future.take());
        // Vacant (finished, stale wake) or the block_on root.
        let Some(mut future) = taken else {
            return;
        };
        match self.poll_with(key, future.as_mut()) {
            Poll::Ready(()) => {
                self.tasks.borrow_mut().try_remove(key);
            }
            Poll::Pending => {
                if let Some(entry) = self.tasks.borrow_mut().get_mut(key) {
                    entry.future = Some(future);
                }
            }
        }
    }

    /// Drives `future` and every ambient task until `future` completes.
    ///
    /// `pending` reports the scheduled-task count for the stall error.
    pub(crate) fn block_on<F: Future>(
        &self,
        future: F,
        pending: impl Fn() -> usize,
    ) -> Result<F::Output> {
        let _guard = self.enter()?;
        let mut future = pin!(future);
        let root = self.insert(None);
        let _root = RootGuard { exec: self, key: root };
        self.queues.borrow_mut().ready.push_back(root);

        while let Some(key) = self.next_ready() {
            if key == root {
                if let Poll::Ready(output) = self.poll_with(root, future.as_mut()) {
                    return Ok(output);
                }
            } else {
                self.poll_ambient(key);
            }
        }
        let pending = pending();
        warn!(pending, "executor stalled");
        Err(SchedulerError::Stalled { pending })
    }

    /// Polls ambient tasks until none is runnable. Returns the number of polls.
    pub(crate) fn run_until_stalled(&self) -> Result<usize> {
        let _guard = self.enter()?;
        let mut polls = 0;
        while let Some(key) = self.next_ready() {
            self.poll_ambient(key);
            polls += 1;
        }
        Ok(polls)
    }
}

struct RunGuard<'a> {
    exec: &'a Executor,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut queues = self.exec.queues.borrow_mut();
        queues.running = false;
        queues.current = None;
    }
}

struct RootGuard<'a> {
    exec: &'a Executor,
    key: usize,
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        self.exec.tasks.borrow_mut().try_remove(self.key);
        let mut queues = self.exec.queues.borrow_mut();
        queues.ready.retain(|&key| key != self.key);
        queues.deferred.retain(|&key| key != self.key);
        if queues.sealed_by == Some(self.key) {
            queues.sealed_by = None;
            queues.flush_deferred();
        }
    }
}
