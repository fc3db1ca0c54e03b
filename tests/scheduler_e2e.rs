#![allow(missing_docs)]
//! End-to-end scheduler behavior.
//!
//! - Release accounting (`wait_one`, `wait_all`, `wait_for`)
//! - Continuation pass: immediate vs post-suspension registration
//! - Sequences: strict step order, failure short-circuit, interleaving
//! - Serialized releases across concurrent waiters
//! - Act hook precedence
//! - `fresh()` reproduces a run from a clean slate
//! - A wait dropped mid-release keeps its task in the report
//! - Error surfaces: empty scheduler, stalled executor, replay mismatch

mod common;

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use common::*;
use futures_lite::future;
use schedlab::{
    ActHook, FifoSelector, ReplayBuilder, Scheduler, SchedulerError, SeededSelector,
    SequenceOutcome, SequenceStep, TaskKind, TaskStatus, yield_now,
};

const SEEDS: std::ops::Range<u64> = 0..16;

// =========================================================================
// Release accounting
// =========================================================================

#[test]
fn wait_one_releases_one_task_per_call() {
    init_test("wait_one_releases_one_task_per_call");
    for seed in SEEDS {
        let s = Scheduler::with_selector(SeededSelector::new(seed));
        let handles: Vec<_> = (0..5).map(|i| s.schedule(ok(i))).collect();

        for released in 1..=handles.len() {
            s.block_on(s.wait_one()).expect("block_on").expect("wait_one");
            assert_with_log!(
                s.count() == handles.len() - released,
                "pending after wait_one",
                handles.len() - released,
                s.count()
            );
            let settled = handles.iter().filter(|h| h.is_settled()).count();
            assert_eq!(settled, released, "seed {seed}");
        }
        assert_eq!(
            s.block_on(s.wait_one()).expect("block_on"),
            Err(SchedulerError::NoPendingTask)
        );
    }
    test_complete!("wait_one_releases_one_task_per_call");
}

#[test]
fn task_failures_are_data() {
    init_test("task_failures_are_data");
    let s = Scheduler::with_selector(FifoSelector);
    let bad = s.schedule_with(async { Err::<u8, _>("boom") }, label("bad"));
    let good = s.schedule_with(ok(7u8), label("good"));

    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    assert_eq!(
        outline(&s),
        [
            ("bad".to_string(), TaskStatus::Rejected),
            ("good".to_string(), TaskStatus::Resolved),
        ]
    );
    assert_eq!(future::block_on(bad), Err("boom"));
    assert_eq!(future::block_on(good), Ok(7));
    test_complete!("task_failures_are_data");
}

// =========================================================================
// Continuation pass
// =========================================================================

/// p1 and p2 are scheduled; a continuation of p1 schedules p3, either
/// directly or after one suspension point.
fn continuation_scenario(seed: u64, suspend_first: bool) -> Scheduler {
    let s = Scheduler::with_selector(SeededSelector::new(seed));
    let p1 = s.schedule_with(ok(1), label("p1"));
    let _p2 = s.schedule_with(ok(2), label("p2"));

    let registrar = s.clone();
    let _continuation = s.spawn(async move {
        let _ = p1.await;
        if suspend_first {
            yield_now().await;
        }
        registrar.schedule_with(ok(3), label("p3")).await
    });

    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    s
}

#[test]
fn immediate_continuation_is_released_by_same_wait_all() {
    init_test("immediate_continuation_is_released_by_same_wait_all");
    for seed in SEEDS {
        let s = continuation_scenario(seed, false);
        assert_with_log!(s.count() == 0, "pending after wait_all", 0, s.count());
        let released: Vec<_> = outline(&s).into_iter().map(|(l, _)| l).collect();
        assert_eq!(released.len(), 3, "seed {seed}");
        assert!(released.contains(&"p3".to_string()), "seed {seed}");
        assert!(
            s.report().iter().all(|e| e.status == TaskStatus::Resolved),
            "seed {seed}"
        );
    }
    test_complete!("immediate_continuation_is_released_by_same_wait_all");
}

#[test]
fn suspended_continuation_is_left_for_a_later_pass() {
    init_test("suspended_continuation_is_left_for_a_later_pass");
    for seed in SEEDS {
        let s = continuation_scenario(seed, true);
        let released: Vec<_> = outline(&s).into_iter().map(|(l, _)| l).collect();
        assert_eq!(released.len(), 2, "seed {seed}: {released:?}");
        assert!(!released.contains(&"p3".to_string()), "seed {seed}");

        test_section!("drain ambient work");
        s.run_until_stalled().expect("run_until_stalled");
        assert_with_log!(s.count() == 1, "p3 pending", 1, s.count());
        let last = s.report().pop().expect("entry");
        assert_eq!((last.label.as_str(), last.status), ("p3", TaskStatus::Pending));
    }
    test_complete!("suspended_continuation_is_left_for_a_later_pass");
}

#[test]
fn recursive_function_calls_are_released_by_one_wait_all() {
    init_test("recursive_function_calls_are_released_by_one_wait_all");
    let s = Scheduler::with_selector(SeededSelector::new(11));
    let countdown =
        s.schedule_function("countdown", |(n,): (u32,)| async move { Ok::<_, Infallible>(n) });

    let f = countdown.clone();
    let driver = s.spawn(async move {
        let mut n = 3;
        let mut calls = 0;
        loop {
            calls += 1;
            let got = f.call((n,)).await.unwrap_or(0);
            if got == 0 {
                return calls;
            }
            n = got - 1;
        }
    });

    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    assert_eq!(s.count(), 0);
    let labels: Vec<_> = s.report().into_iter().map(|e| e.label).collect();
    assert_eq!(
        labels,
        ["countdown(3)", "countdown(2)", "countdown(1)", "countdown(0)"]
    );
    assert!(s.report().iter().all(|e| e.kind == TaskKind::Function));
    assert_eq!(s.block_on(driver).expect("block_on"), 4);
    test_complete!("recursive_function_calls_are_released_by_one_wait_all");
}

// =========================================================================
// wait_for
// =========================================================================

#[test]
fn wait_for_releases_only_what_the_target_needs() {
    init_test("wait_for_releases_only_what_the_target_needs");
    let s = Scheduler::with_selector(FifoSelector);
    let p1 = s.schedule_with(ok(1), label("p1"));
    let p2 = s.schedule_with(ok(2), label("p2"));
    let _p3 = s.schedule_with(ok(3), label("p3"));

    let total = s
        .block_on(s.wait_for(async {
            let a = p1.await.unwrap_or(0);
            let b = p2.await.unwrap_or(0);
            a + b
        }))
        .expect("block_on")
        .expect("wait_for");

    assert_eq!(total, 3);
    assert_eq!(
        outline(&s),
        [
            ("p1".to_string(), TaskStatus::Resolved),
            ("p2".to_string(), TaskStatus::Resolved),
            ("p3".to_string(), TaskStatus::Pending),
        ]
    );
    test_complete!("wait_for_releases_only_what_the_target_needs");
}

#[test]
fn wait_for_forwards_target_failure() {
    init_test("wait_for_forwards_target_failure");
    let s = Scheduler::with_selector(FifoSelector);
    let failing = s.schedule(async { Err::<(), _>("nope") });
    let out = s.block_on(s.wait_for(failing)).expect("block_on");
    assert_eq!(out, Ok(Err("nope")));
    assert_eq!(s.report()[0].status, TaskStatus::Rejected);
    test_complete!("wait_for_forwards_target_failure");
}

#[test]
fn concurrent_wait_for_releases_are_totally_ordered() {
    init_test("concurrent_wait_for_releases_are_totally_ordered");
    for seed in SEEDS {
        let log = Rc::new(RefCell::new(Vec::new()));
        let hook_log = Rc::clone(&log);
        // Suspends inside the step so a second release would show up nested.
        let hook = ActHook::new(move |body| {
            let log = Rc::clone(&hook_log);
            async move {
                log.borrow_mut().push("enter");
                yield_now().await;
                body.await;
                yield_now().await;
                log.borrow_mut().push("exit");
            }
        });
        let s = Scheduler::with_selector_and_act(SeededSelector::new(seed), hook);
        let a1 = s.schedule(ok("a1"));
        let b1 = s.schedule(ok("b1"));
        let a2 = s.schedule(ok("a2"));
        let b2 = s.schedule(ok("b2"));

        let (sa, sb) = (s.clone(), s.clone());
        let ja = s.spawn(async move { sa.wait_for(async { (a1.await, a2.await) }).await });
        let jb = s.spawn(async move { sb.wait_for(async { (b1.await, b2.await) }).await });
        let (ra, rb) = s.block_on(future::zip(ja, jb)).expect("block_on");

        assert_eq!(ra, Ok((Ok("a1"), Ok("a2"))));
        assert_eq!(rb, Ok((Ok("b1"), Ok("b2"))));
        assert_eq!(s.count(), 0);

        let log = log.borrow();
        assert_with_log!(log.len() == 8, "hook events", 8, log.len());
        assert!(
            log.chunks(2).all(|pair| pair == ["enter", "exit"]),
            "seed {seed}: overlapping releases {log:?}"
        );
    }
    test_complete!("concurrent_wait_for_releases_are_totally_ordered");
}

// =========================================================================
// Sequences
// =========================================================================

fn logged_step(
    log: &Rc<RefCell<Vec<&'static str>>>,
    name: &'static str,
    fail: bool,
) -> SequenceStep {
    let log = Rc::clone(log);
    SequenceStep::new(name, move || async move {
        log.borrow_mut().push(name);
        if fail { Err(format!("{name} failed")) } else { Ok(()) }
    })
}

#[test]
fn failing_step_stops_the_sequence() {
    init_test("failing_step_stops_the_sequence");
    let log = Rc::new(RefCell::new(Vec::new()));
    let s = Scheduler::with_selector(FifoSelector);
    let seq = s.schedule_sequence([
        logged_step(&log, "a", false),
        logged_step(&log, "b", true),
        logged_step(&log, "c", false),
    ]);

    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    assert_eq!(*log.borrow(), ["a", "b"]);
    assert!(seq.is_faulty());
    assert!(!seq.is_done());
    assert_eq!(
        s.block_on(seq.task()).expect("block_on"),
        SequenceOutcome {
            done: false,
            faulty: true
        }
    );
    assert_eq!(
        outline(&s),
        [
            ("a".to_string(), TaskStatus::Resolved),
            ("b".to_string(), TaskStatus::Rejected),
        ]
    );
    test_complete!("failing_step_stops_the_sequence");
}

#[test]
fn sequence_is_done_only_after_every_step_settled() {
    init_test("sequence_is_done_only_after_every_step_settled");
    let log = Rc::new(RefCell::new(Vec::new()));
    let s = Scheduler::with_selector(FifoSelector);
    let seq = s.schedule_sequence([logged_step(&log, "a", false), logged_step(&log, "b", false)]);

    s.block_on(s.wait_one()).expect("block_on").expect("first step");
    assert!(!seq.is_done());
    assert_eq!(s.count(), 1, "second step registered after the first settled");

    s.block_on(s.wait_one()).expect("block_on").expect("second step");
    assert!(seq.is_done());
    assert!(!seq.is_faulty());
    assert_eq!(
        s.block_on(seq.task()).expect("block_on"),
        SequenceOutcome {
            done: true,
            faulty: false
        }
    );
    test_complete!("sequence_is_done_only_after_every_step_settled");
}

#[test]
fn unrelated_tasks_interleave_between_steps() {
    init_test("unrelated_tasks_interleave_between_steps");
    let log = Rc::new(RefCell::new(Vec::new()));
    // Ids: a = 1, x = 2, b = 3 (registered once a settles).
    let s = ReplayBuilder::new([1u32, 2, 3]).build();
    let _seq = s.schedule_sequence([logged_step(&log, "a", false), logged_step(&log, "b", false)]);
    let _x = s.schedule_with(ok("x"), label("x"));

    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    let labels: Vec<_> = outline(&s).into_iter().map(|(l, _)| l).collect();
    assert_eq!(labels, ["a", "x", "b"]);
    test_complete!("unrelated_tasks_interleave_between_steps");
}

// =========================================================================
// Act hook, fresh(), error surfaces
// =========================================================================

#[test]
fn per_call_hook_beats_instance_hook() {
    init_test("per_call_hook_beats_instance_hook");
    let (instance, instance_calls) = counting_hook();
    let (per_call, per_call_calls) = counting_hook();
    let s = Scheduler::with_selector_and_act(FifoSelector, instance);
    let _tasks: Vec<_> = (0..4).map(|i| s.schedule(ok(i))).collect();

    s.block_on(s.wait_one_with(per_call.clone())).expect("block_on").expect("wait_one");
    assert_eq!((instance_calls.get(), per_call_calls.get()), (0, 1));

    s.block_on(s.wait_one()).expect("block_on").expect("wait_one");
    assert_eq!((instance_calls.get(), per_call_calls.get()), (1, 1));

    s.block_on(s.wait_all_with(per_call)).expect("block_on").expect("wait_all");
    assert_eq!((instance_calls.get(), per_call_calls.get()), (1, 3));
    test_complete!("per_call_hook_beats_instance_hook");
}

#[test]
fn wait_for_with_hook_beats_instance_hook() {
    init_test("wait_for_with_hook_beats_instance_hook");
    let (instance, instance_calls) = counting_hook();
    let (per_call, per_call_calls) = counting_hook();
    let s = Scheduler::with_selector_and_act(FifoSelector, instance);
    let p1 = s.schedule(ok(1));
    let p2 = s.schedule(ok(2));
    let _p3 = s.schedule(ok(3));

    let target = async { p1.await.unwrap_or(0) + p2.await.unwrap_or(0) };
    let sum = s
        .block_on(s.wait_for_with(target, per_call))
        .expect("block_on")
        .expect("wait_for");
    assert_eq!(sum, 3);
    assert_eq!((instance_calls.get(), per_call_calls.get()), (0, 2));

    test_section!("instance hook for a plain wait_for");
    let rest = s.schedule(ok(4));
    let got = s
        .block_on(s.wait_for(rest))
        .expect("block_on")
        .expect("wait_for");
    assert_eq!(got, Ok(4));
    assert_eq!(instance_calls.get(), 2, "p3 then rest, both under the instance hook");
    assert_eq!(per_call_calls.get(), 2);
    test_complete!("wait_for_with_hook_beats_instance_hook");
}

#[test]
fn fresh_reproduces_the_run() {
    init_test("fresh_reproduces_the_run");
    let (hook, calls) = counting_hook();
    let program = |s: &Scheduler| {
        let a = s.schedule_with(ok(1), label("a"));
        let _b = s.schedule_with(async { Err::<(), _>("b") }, label("b"));
        let registrar = s.clone();
        let _follow = s.spawn(async move {
            let _ = a.await;
            registrar.schedule_with(ok(2), label("after-a")).await
        });
        s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    };

    let original = Scheduler::with_selector_and_act(SeededSelector::new(99), hook);
    program(&original);

    let copy = original.fresh();
    assert_eq!(copy.count(), 0);
    assert!(copy.report().is_empty());
    program(&copy);

    assert_eq!(copy.report(), original.report());
    assert_eq!(copy.render(), original.render());
    assert_eq!(calls.get(), 6, "the hook is shared configuration");
    test_complete!("fresh_reproduces_the_run");
}

#[test]
fn dropped_wait_keeps_its_selected_task_in_the_report() {
    init_test("dropped_wait_keeps_its_selected_task_in_the_report");
    let s = Scheduler::with_selector(FifoSelector);
    let _slow = s.schedule_with(
        async {
            yield_now().await;
            Ok::<_, Infallible>(1)
        },
        label("slow"),
    );
    let _fast = s.schedule_with(ok(2), label("fast"));

    let polled = s
        .block_on(async { future::poll_once(s.wait_one()).await.is_some() })
        .expect("block_on");
    assert!(!polled, "the release of `slow` suspends");
    assert_eq!(s.count(), 1);
    assert_eq!(
        outline(&s),
        [
            ("slow".to_string(), TaskStatus::Pending),
            ("fast".to_string(), TaskStatus::Pending),
        ]
    );

    test_section!("remaining work");
    s.block_on(s.wait_all()).expect("block_on").expect("wait_all");
    assert_eq!(s.count(), 0);
    assert_eq!(
        outline(&s),
        [
            ("slow".to_string(), TaskStatus::Pending),
            ("fast".to_string(), TaskStatus::Resolved),
        ]
    );
    test_complete!("dropped_wait_keeps_its_selected_task_in_the_report");
}

#[test]
fn block_on_reports_a_stall() {
    init_test("block_on_reports_a_stall");
    let s = Scheduler::with_selector(FifoSelector);
    let never = s.schedule(ok(1));
    assert_eq!(
        s.block_on(never).unwrap_err(),
        SchedulerError::Stalled { pending: 1 }
    );
    assert_eq!(s.count(), 1);
    test_complete!("block_on_reports_a_stall");
}

#[test]
fn nested_block_on_is_rejected() {
    init_test("nested_block_on_is_rejected");
    let s = Scheduler::with_selector(FifoSelector);
    let inner = s.clone();
    let out = s
        .block_on(async move { inner.block_on(async {}) })
        .expect("outer");
    assert_eq!(out, Err(SchedulerError::Reentrant));
    test_complete!("nested_block_on_is_rejected");
}

#[test]
fn replay_mismatches_surface_from_waits() {
    init_test("replay_mismatches_surface_from_waits");
    let s = ReplayBuilder::new([1u32, 9]).build();
    let _a = s.schedule(ok(()));
    let _b = s.schedule(ok(()));
    let err = s.block_on(s.wait_all()).expect("block_on").unwrap_err();
    assert!(err.is_replay_mismatch());
    assert!(matches!(err, SchedulerError::UnknownTaskRequested { .. }));
    assert_eq!(s.count(), 1);

    let s = ReplayBuilder::new([1u32]).build();
    let _a = s.schedule(ok(()));
    let _b = s.schedule(ok(()));
    let err = s.block_on(s.wait_all()).expect("block_on").unwrap_err();
    assert_eq!(err, SchedulerError::SequenceExhausted { recorded: 1 });
    test_complete!("replay_mismatches_surface_from_waits");
}
