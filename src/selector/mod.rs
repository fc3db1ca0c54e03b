//! Ordering strategies: who gets released next.
//!
//! A [`TaskSelector`] is consulted once per release with the current pending
//! list (in pending order) and answers with a *position* in that list. It is
//! the only input that decides completion order, so two runs driven by
//! selectors in the same state release tasks in the same order.
//!
//! # Flavors
//!
//! - [`ReplaySelector`]: follows a recorded sequence of task ids
//! - [`SeededSelector`]: pseudo-random from a seed
//! - [`ChoiceSelector`]: follows raw recorded decisions (the shrinkable form)
//! - [`FifoSelector`]: always the oldest pending task
//! - [`FnSelector`]: adapts an external decision source
//!
//! Every selector can [`restart`](TaskSelector::restart): produce an
//! independent copy whose cursor is back at the first decision. That is what
//! lets [`Scheduler::fresh`](crate::Scheduler::fresh) replay a schedule from a
//! clean slate.

mod driven;
mod replay;

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::types::TaskView;

pub use driven::{ChoiceSelector, SeededSelector};
pub use replay::ReplaySelector;

/// Policy deciding which pending task to release next.
pub trait TaskSelector {
    /// Returns the position, within `pending`, of the task to release.
    ///
    /// `pending` is never empty. Returning an index outside it is reported
    /// as [`SchedulerError::IndexOutOfRange`](crate::SchedulerError::IndexOutOfRange).
    fn next_index(&mut self, pending: &[TaskView]) -> Result<usize>;

    /// Returns an independent selector restarted at its first decision.
    fn restart(&self) -> Box<dyn TaskSelector>;

    /// Short description for logs and `Debug` output.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

/// Always releases the oldest pending task.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoSelector;

impl TaskSelector for FifoSelector {
    fn next_index(&mut self, _pending: &[TaskView]) -> Result<usize> {
        Ok(0)
    }

    fn restart(&self) -> Box<dyn TaskSelector> {
        Box::new(Self)
    }

    fn describe(&self) -> String {
        "fifo".to_string()
    }
}

type Decide = Box<dyn FnMut(&[TaskView]) -> usize>;

/// Adapts an external source of ordering decisions.
///
/// The factory is invoked once up front and again on every restart, so it
/// must rebuild the decision source from its initial state (typically from a
/// seed it captured).
///
/// ```
/// use schedlab::{FnSelector, TaskSelector};
///
/// let last = FnSelector::new(|| |pending: &[schedlab::TaskView]| pending.len() - 1);
/// assert_eq!(last.describe(), "fn");
/// ```
pub struct FnSelector {
    factory: Rc<dyn Fn() -> Decide>,
    decide: Decide,
}

impl FnSelector {
    /// Creates a selector from a factory of decision closures.
    pub fn new<M, D>(factory: M) -> Self
    where
        M: Fn() -> D + 'static,
        D: FnMut(&[TaskView]) -> usize + 'static,
    {
        let factory: Rc<dyn Fn() -> Decide> = Rc::new(move || Box::new(factory()) as Decide);
        let decide = factory();
        Self { factory, decide }
    }
}

impl TaskSelector for FnSelector {
    fn next_index(&mut self, pending: &[TaskView]) -> Result<usize> {
        Ok((self.decide)(pending))
    }

    fn restart(&self) -> Box<dyn TaskSelector> {
        Box::new(Self {
            factory: Rc::clone(&self.factory),
            decide: (self.factory)(),
        })
    }

    fn describe(&self) -> String {
        "fn".to_string()
    }
}

impl fmt::Debug for FnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSelector").finish_non_exhaustive()
    }
}
