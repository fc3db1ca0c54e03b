//! Identifier types for scheduled tasks.
//!
//! A [`TaskId`] names one intercepted asynchronous operation. Ids are handed
//! out in registration order and are never reused within a scheduler run, so
//! a recorded id sequence can be replayed against a fresh run of the same
//! program.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// A unique identifier for a task registered with a scheduler.
///
/// The first registered task gets id `1`. Replay sequences refer to tasks by
/// id, never by their position in the pending list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// The id given to the first task of a run.
    pub const FIRST: Self = Self(1);

    /// Creates a task id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the id that follows this one.
    #[inline]
    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for TaskId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

impl fmt::Display for TaskId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<u32> for TaskId {
    #[inline]
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl FromStr for TaskId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}
