//! Replay ordering: follow a recorded sequence of task ids.

use std::rc::Rc;

use super::TaskSelector;
use crate::error::{Result, SchedulerError};
use crate::tracing_compat::warn;
use crate::types::{TaskId, TaskView};

/// Releases tasks in a fixed, previously recorded id order.
///
/// Each decision looks up the *next recorded id* among the pending tasks and
/// returns its position. If that id is not pending the recording no longer
/// describes a legal execution of the program under test and the decision
/// fails with [`SchedulerError::UnknownTaskRequested`]; asking for more
/// decisions than were recorded fails with [`SchedulerError::SequenceExhausted`].
#[derive(Debug, Clone)]
pub struct ReplaySelector {
    ids: Rc<[TaskId]>,
    cursor: usize,
}

impl ReplaySelector {
    /// Creates a replay selector over `ids`.
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TaskId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    /// Returns the recorded id sequence.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    /// Returns how many decisions have been consumed.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl TaskSelector for ReplaySelector {
    fn next_index(&mut self, pending: &[TaskView]) -> Result<usize> {
        let Some(&id) = self.ids.get(self.cursor) else {
            warn!(recorded = self.ids.len(), "replay sequence exhausted");
            return Err(SchedulerError::SequenceExhausted {
                recorded: self.ids.len(),
            });
        };
        let Some(position) = pending.iter().position(|task| task.id == id) else {
            warn!(requested = %id, "replay requested a task that is not pending");
            return Err(SchedulerError::UnknownTaskRequested {
                id,
                pending: pending.iter().map(|task| task.id).collect(),
            });
        };
        self.cursor += 1;
        Ok(position)
    }

    fn restart(&self) -> Box<dyn TaskSelector> {
        Box::new(Self {
            ids: Rc::clone(&self.ids),
            cursor: 0,
        })
    }

    fn describe(&self) -> String {
        format!("replay({}/{})", self.cursor, self.ids.len())
    }
}
