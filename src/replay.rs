//! Replay ordering: hand-written interleavings and reloaded reports.
//!
//! ```
//! use schedlab::{ReplayBuilder, scheduler_for};
//!
//! // Hand-crafted: release task 2 first, then task 1.
//! let scheduler = ReplayBuilder::new([2u32, 1]).build();
//! # let _ = scheduler;
//!
//! // Pasted straight from a failure report.
//! let reloaded = scheduler_for!(r#"
//! -> [task${2}] promise::b resolved
//! -> [task${1}] promise::a pending
//! "#)?;
//! assert_eq!(reloaded.count(), 0);
//! # Ok::<(), schedlab::SchedulerError>(())
//! ```

use crate::error::{Result, SchedulerError};
use crate::scheduler::{ActHook, Scheduler};
use crate::selector::ReplaySelector;
use crate::types::TaskId;

const ENTRY_MARKER: &str = "->";
const ID_OPEN: &str = "[task${";
const ID_CLOSE: &str = "}]";

/// Builds a scheduler that releases tasks in a fixed id order.
#[derive(Debug, Clone, Default)]
pub struct ReplayBuilder {
    ids: Vec<TaskId>,
    act: Option<ActHook>,
}

impl ReplayBuilder {
    /// Replays `ids` in order.
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TaskId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            act: None,
        }
    }

    /// Replays the id order encoded in a rendered report.
    pub fn parse(text: &str) -> Result<Self> {
        parse_report_ids(text).map(Self::new)
    }

    /// Installs an instance-level act hook on the built scheduler.
    #[must_use]
    pub fn act(mut self, act: ActHook) -> Self {
        self.act = Some(act);
        self
    }

    /// The id order to replay.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    /// Builds the scheduler.
    #[must_use]
    pub fn build(self) -> Scheduler {
        Scheduler::from_parts(Box::new(ReplaySelector::new(self.ids)), self.act)
    }
}

/// Extracts task ids, in order, from a rendered report.
///
/// Only lines starting with `->` are entries; everything else (the
/// `scheduler_for!` header and footer, blank lines) is ignored. Settled and
/// pending entries both contribute their id.
pub fn parse_report_ids(text: &str) -> Result<Vec<TaskId>> {
    let mut ids = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let Some(entry) = line.trim_start().strip_prefix(ENTRY_MARKER) else {
            continue;
        };
        ids.push(parse_entry_id(entry.trim_start(), index + 1)?);
    }
    Ok(ids)
}

fn parse_entry_id(entry: &str, line: usize) -> Result<TaskId> {
    let rest = entry
        .strip_prefix(ID_OPEN)
        .ok_or_else(|| SchedulerError::malformed(line, format!("expected {ID_OPEN:?}")))?;
    let (digits, _) = rest
        .split_once(ID_CLOSE)
        .ok_or_else(|| SchedulerError::malformed(line, format!("expected {ID_CLOSE:?}")))?;
    digits
        .parse::<TaskId>()
        .map_err(|err| SchedulerError::malformed(line, format!("task id {digits:?}: {err}")))
}

/// Rebuilds a replaying scheduler from a rendered report.
///
/// Evaluates to `Result<Scheduler, SchedulerError>`. An optional second
/// argument installs an act hook.
#[macro_export]
macro_rules! scheduler_for {
    ($text:expr $(,)?) => {
        $crate::ReplayBuilder::parse($text).map($crate::ReplayBuilder::build)
    };
    ($text:expr, act = $act:expr $(,)?) => {
        $crate::ReplayBuilder::parse($text).map(|builder| builder.act($act).build())
    };
}
