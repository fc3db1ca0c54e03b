//! `proptest` strategies producing schedulers.
//!
//! A generated scheduler is driven by a [`ChoiceSelector`] over a vector of
//! raw decisions. Shrinking the vector (fewer decisions, smaller values)
//! moves the schedule toward FIFO order, so a minimized counterexample keeps
//! only the reorderings the failure actually needs.
//!
//! Each generated value is a scheduler that has not run yet. Put
//! [`render`](Scheduler::render) in the assertion message: for the minimal
//! case it is a `scheduler_for!` literal ready to paste into a regression test.
//!
//! ```
//! use proptest::prelude::*;
//! use schedlab::arbitrary::schedulers;
//! use std::convert::Infallible;
//!
//! proptest!(|(s in schedulers())| {
//!     let a = s.schedule(async { Ok::<_, Infallible>(1) });
//!     let b = s.schedule(async { Ok::<_, Infallible>(2) });
//!     s.block_on(s.wait_all()).unwrap().unwrap();
//!     prop_assert!(a.is_settled() && b.is_settled(), "{}", s.render());
//! });
//! ```

use proptest::collection::vec;
use proptest::prelude::*;

use crate::scheduler::{ActHook, Scheduler};
use crate::selector::ChoiceSelector;

/// Upper bound on recorded decisions; later ones fall back to FIFO.
pub const MAX_DECISIONS: usize = 64;

fn decisions() -> impl Strategy<Value = Vec<u32>> {
    vec(any::<u32>(), 0..=MAX_DECISIONS)
}

/// Schedulers without an act hook.
pub fn schedulers() -> impl Strategy<Value = Scheduler> {
    decisions().prop_map(|choices| Scheduler::with_selector(ChoiceSelector::new(choices)))
}

/// Schedulers with `act` installed as the instance-level hook.
pub fn schedulers_with(act: ActHook) -> impl Strategy<Value = Scheduler> {
    decisions().prop_map(move |choices| {
        Scheduler::with_selector_and_act(ChoiceSelector::new(choices), act.clone())
    })
}
