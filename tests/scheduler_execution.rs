//! Scheduler end-to-end suite.
//!
//! Validates the runtime guarantees the combinators lean on:
//! - **Synchronous launch**: every task is spawned, in input order, before
//!   a combinator first suspends
//! - **Orphan continuation**: tasks left behind by an early resolution run
//!   to completion with their results discarded
//! - **Determinism**: identical workloads produce identical traces
//! - **Step limit**: busy-waking work trips the configured backstop

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use settle::test_utils::{init_test_logging, timed_task, CompleteAfterPolls, Counter};
use settle::{
    first_settle, Outcome, Scheduler, SchedulerConfig, Task, TaskId, TraceEventKind,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[test]
fn tasks_are_spawned_in_input_order_before_first_suspension() {
    init_test_logging();
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();

    let tasks: Vec<Task<i32, String>> = vec![
        timed_task(&handle, ms(20), Outcome::Fulfilled(0)),
        timed_task(&handle, ms(10), Outcome::Fulfilled(1)),
        timed_task(&handle, ms(30), Outcome::Fulfilled(2)),
    ];

    // Constructing the combinator is what launches; not polling it yet.
    let combined = first_settle(&handle, tasks);
    let spawns: Vec<Option<TaskId>> = scheduler
        .trace_snapshot()
        .iter()
        .filter(|e| e.kind == TraceEventKind::Spawn)
        .map(|e| e.task)
        .collect();
    assert_eq!(spawns.len(), 3, "all spawns precede the first poll");
    assert!(spawns.windows(2).all(|pair| pair[0] < pair[1]));

    let settled = scheduler.block_on(combined).expect("one task settles");
    assert_eq!(settled.index, 1);
}

#[test]
fn orphaned_tasks_run_to_completion_with_results_discarded() {
    init_test_logging();
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();

    let effects = Rc::new(RefCell::new(Vec::new()));
    let tasks: Vec<Task<u64, String>> = (0u64..3)
        .map(|i| {
            let handle = handle.clone();
            let effects = Rc::clone(&effects);
            Task::new(async move {
                handle.sleep(ms(10 * (i + 1))).await;
                effects.borrow_mut().push(i);
                Outcome::Fulfilled(i)
            })
        })
        .collect();

    let settled = scheduler
        .block_on(first_settle(&handle, tasks))
        .expect("fastest settles");
    assert_eq!(settled.index, 0);
    assert_eq!(*effects.borrow(), vec![0]);

    // The losers were never cancelled; drive the scheduler dry and watch
    // their side effects land. Nothing observes their outcomes.
    scheduler.run_until_quiescent();
    assert_eq!(*effects.borrow(), vec![0, 1, 2]);
    assert_eq!(scheduler.pending_tasks(), 0);
}

#[test]
fn identical_workloads_produce_identical_traces() {
    init_test_logging();

    let run = || {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();
        let tasks: Vec<Task<i32, String>> = vec![
            timed_task(&handle, ms(15), Outcome::Fulfilled(1)),
            timed_task(&handle, ms(5), Outcome::Rejected("nope".to_string())),
            timed_task(&handle, ms(25), Outcome::Fulfilled(3)),
        ];
        let outcomes = scheduler.block_on(settle::all_settle(&handle, tasks));
        (outcomes, scheduler.trace_snapshot())
    };

    let (outcomes_a, trace_a) = run();
    let (outcomes_b, trace_b) = run();
    assert_eq!(outcomes_a, outcomes_b);
    assert_eq!(trace_a, trace_b);
}

#[test]
fn trace_json_is_a_parsable_artifact() {
    init_test_logging();
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();

    drop(handle.spawn(async { 1 }));
    scheduler.run_until_quiescent();

    let parsed: serde_json::Value =
        serde_json::from_str(&scheduler.trace_json()).expect("trace renders as JSON");
    let events = parsed.as_array().expect("array of events");
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["kind"], "Spawn");
    assert_eq!(events[2]["kind"], "Complete");
}

#[test]
fn self_waking_tasks_are_rescheduled_fairly() {
    init_test_logging();
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();

    let counter = Counter::new();
    let polls = scheduler.block_on({
        let task = handle.spawn(CompleteAfterPolls::new(4, Arc::clone(&counter)));
        task
    });
    assert_eq!(polls, 5);
    assert_eq!(counter.get(), 5);
}

#[test]
#[should_panic(expected = "step limit")]
fn busy_waking_work_trips_the_step_limit() {
    let mut scheduler = Scheduler::with_config(SchedulerConfig::default().max_steps(50));
    let handle = scheduler.handle();

    let counter = Counter::new();
    let endless = handle.spawn(CompleteAfterPolls::new(u32::MAX, counter));
    scheduler.block_on(endless);
}

#[test]
fn virtual_time_is_shared_across_tasks() {
    init_test_logging();
    let mut scheduler = Scheduler::new();
    let handle = scheduler.handle();

    let outer = handle.clone();
    let (a, b) = scheduler.block_on(async move {
        let first = {
            let h = outer.clone();
            outer.spawn(async move {
                h.sleep(ms(10)).await;
                h.now()
            })
        };
        let second = {
            let h = outer.clone();
            outer.spawn(async move {
                h.sleep(ms(10)).await;
                h.now()
            })
        };
        (first.await, second.await)
    });

    // Both slept the same virtual duration and woke at the same instant.
    assert_eq!(a, b);
    assert_eq!(a.as_millis(), 10);
}
