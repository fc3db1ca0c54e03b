//! Scheduler configuration.
//!
//! A [`SchedulerConfig`] picks the ordering strategy and the instance-level
//! act hook. It is either built in code or read from the environment, which
//! lets a failing CI run be reproduced locally without editing the test:
//!
//! | Variable          | Meaning                                                 |
//! |-------------------|---------------------------------------------------------|
//! | `SCHEDLAB_SEED`   | Seed for pseudo-random ordering (decimal or `0x` hex)   |
//! | `SCHEDLAB_REPLAY` | Comma-separated task ids to replay; wins over the seed  |

use std::fmt;

use crate::error::{Result, SchedulerError};
use crate::scheduler::ActHook;
use crate::selector::{ReplaySelector, SeededSelector, TaskSelector};
use crate::types::TaskId;

/// Environment variable holding the ordering seed.
pub const SEED_ENV: &str = "SCHEDLAB_SEED";
/// Environment variable holding a replay id list.
pub const REPLAY_ENV: &str = "SCHEDLAB_REPLAY";

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Configuration for building a [`Scheduler`](crate::Scheduler).
#[derive(Clone)]
pub struct SchedulerConfig {
    seed: u64,
    replay: Option<Vec<TaskId>>,
    act: Option<ActHook>,
}

impl SchedulerConfig {
    /// Seeded configuration with no act hook.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            replay: None,
            act: None,
        }
    }

    /// Replays `ids` instead of seeded ordering.
    #[must_use]
    pub fn replay<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TaskId>,
    {
        self.replay = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Installs an instance-level act hook.
    #[must_use]
    pub fn act(mut self, act: ActHook) -> Self {
        self.act = Some(act);
        self
    }

    /// The configured seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The configured replay ids, if any.
    #[must_use]
    pub fn replay_ids(&self) -> Option<&[TaskId]> {
        self.replay.as_deref()
    }

    /// Reads [`SEED_ENV`] and [`REPLAY_ENV`] from the process environment.
    ///
    /// Unset variables fall back to the defaults; set but unparsable ones are
    /// an error rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(SEED_ENV) {
            config.seed = parse_seed(&raw)?;
        }
        if let Some(raw) = lookup(REPLAY_ENV) {
            config.replay = Some(parse_ids(&raw)?);
        }
        Ok(config)
    }

    /// Builds the ordering strategy this configuration describes.
    #[must_use]
    pub fn selector(&self) -> Box<dyn TaskSelector> {
        match &self.replay {
            Some(ids) => Box::new(ReplaySelector::new(ids.iter().copied())),
            None => Box::new(SeededSelector::new(self.seed)),
        }
    }

    pub(crate) fn into_parts(self) -> (Box<dyn TaskSelector>, Option<ActHook>) {
        (self.selector(), self.act)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("seed", &self.seed)
            .field("replay", &self.replay)
            .field("act", &self.act.is_some())
            .finish()
    }
}

fn parse_seed(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|err| SchedulerError::Config(format!("{SEED_ENV}={raw:?}: {err}")))
}

fn parse_ids(raw: &str) -> Result<Vec<TaskId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TaskId>().map_err(|err| {
                SchedulerError::Config(format!("{REPLAY_ENV} entry {part:?}: {err}"))
            })
        })
        .collect()
}
