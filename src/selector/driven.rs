//! Driven ordering: decisions from a seed or from recorded raw choices.

use std::rc::Rc;

use super::TaskSelector;
use crate::error::Result;
use crate::types::TaskView;
use crate::util::DetRng;

/// Pseudo-random ordering, reproducible from its seed.
#[derive(Debug, Clone)]
pub struct SeededSelector {
    seed: u64,
    rng: DetRng,
}

impl SeededSelector {
    /// Creates a selector seeded with `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: DetRng::new(seed),
        }
    }

    /// Returns the seed this selector restarts from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl TaskSelector for SeededSelector {
    fn next_index(&mut self, pending: &[TaskView]) -> Result<usize> {
        Ok(self.rng.next_usize(pending.len()))
    }

    fn restart(&self) -> Box<dyn TaskSelector> {
        Box::new(Self::new(self.seed))
    }

    fn describe(&self) -> String {
        format!("seeded({:#x})", self.seed)
    }
}

/// Ordering driven by a list of raw decisions.
///
/// Decision `k` picks position `choices[k] % pending.len()`. Once the list
/// runs out every further decision picks the oldest pending task. Shrinking
/// the list (shorter, smaller values) therefore converges on FIFO order,
/// which is what a property-testing engine wants from a minimal counterexample.
#[derive(Debug, Clone)]
pub struct ChoiceSelector {
    choices: Rc<[u32]>,
    cursor: usize,
}

impl ChoiceSelector {
    /// Creates a selector over raw `choices`.
    pub fn new(choices: impl Into<Rc<[u32]>>) -> Self {
        Self {
            choices: choices.into(),
            cursor: 0,
        }
    }

    /// Returns the raw decisions.
    #[must_use]
    pub fn choices(&self) -> &[u32] {
        &self.choices
    }
}

impl TaskSelector for ChoiceSelector {
    fn next_index(&mut self, pending: &[TaskView]) -> Result<usize> {
        let index = self
            .choices
            .get(self.cursor)
            .map_or(0, |&choice| choice as usize % pending.len());
        self.cursor += 1;
        Ok(index)
    }

    fn restart(&self) -> Box<dyn TaskSelector> {
        Box::new(Self {
            choices: Rc::clone(&self.choices),
            cursor: 0,
        })
    }

    fn describe(&self) -> String {
        format!("choices({:?})", self.choices)
    }
}
