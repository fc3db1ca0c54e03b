//! Shared helpers for the integration suites.
#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::future::Future;
use std::rc::Rc;

pub use schedlab::test_utils::init_test_logging;
pub use schedlab::{assert_with_log, test_complete, test_phase, test_section};

use schedlab::{ActHook, Scheduler, TaskOptions, TaskStatus};

pub fn init_test(test_name: &str) {
    init_test_logging();
    test_phase!(test_name);
}

/// A computation that succeeds with `value` as soon as it is released.
pub fn ok<T: 'static>(value: T) -> impl Future<Output = Result<T, Infallible>> + 'static {
    async move { Ok(value) }
}

pub fn label(name: &str) -> TaskOptions {
    TaskOptions::new().label(name)
}

/// Act hook counting how many release steps it wrapped.
pub fn counting_hook() -> (ActHook, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let hook = ActHook::new(move |body| {
        let counter = Rc::clone(&counter);
        async move {
            counter.set(counter.get() + 1);
            body.await;
        }
    });
    (hook, calls)
}

/// `(label, status)` pairs in report order.
pub fn outline(scheduler: &Scheduler) -> Vec<(String, TaskStatus)> {
    scheduler
        .report()
        .into_iter()
        .map(|entry| (entry.label, entry.status))
        .collect()
}
