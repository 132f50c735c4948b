//! The scheduler: task storage, ready queue, timers, and the drive loop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::runtime::handle::Handle;
use crate::trace::{TraceBuffer, TraceEvent, TraceEventKind};
use crate::types::{TaskId, Time};

/// A stored task future. Tasks resolve internally (their output is routed
/// through a completion cell), so the stored shape is always `()`.
pub(crate) type StoredFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A registered timer. Ordered by `(deadline, registration sequence)` so
/// same-deadline timers fire in registration order.
pub(crate) struct TimerEntry {
    pub(crate) at: Time,
    pub(crate) seq: u64,
    pub(crate) waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Mutable scheduler state: stored futures, timers, virtual time, trace.
///
/// Shared between the [`Scheduler`] and every [`Handle`]. Never shared
/// with wakers, so it may hold non-`Send` futures.
pub(crate) struct State {
    pub(crate) slots: HashMap<u64, StoredFuture>,
    pub(crate) next_task: u64,
    pub(crate) timers: BinaryHeap<Reverse<TimerEntry>>,
    pub(crate) timer_seq: u64,
    pub(crate) now: Time,
    pub(crate) trace: TraceBuffer,
}

impl State {
    pub(crate) fn new(trace_capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            next_task: 0,
            timers: BinaryHeap::new(),
            timer_seq: 0,
            now: Time::ZERO,
            trace: TraceBuffer::new(trace_capacity),
        }
    }

    pub(crate) fn allocate_task(&mut self) -> TaskId {
        let id = TaskId::from_raw(self.next_task);
        self.next_task += 1;
        id
    }

    pub(crate) fn register_timer(&mut self, at: Time, waker: Waker) {
        let seq = self.timer_seq;
        self.timer_seq += 1;
        self.timers.push(Reverse(TimerEntry { at, seq, waker }));
        let now = self.now;
        self.trace.record(now, TraceEventKind::TimerScheduled, None);
    }

    fn next_deadline(&self) -> Option<Time> {
        self.timers.peek().map(|Reverse(entry)| entry.at)
    }

    /// Pops every timer due at or before `now`, recording fire events.
    /// Wakers are returned so the caller can invoke them after releasing
    /// the state lock.
    fn fire_due_timers(&mut self) -> Vec<Waker> {
        let mut woken = Vec::new();
        while let Some(Reverse(entry)) = self.timers.peek() {
            if entry.at > self.now {
                break;
            }
            let Reverse(entry) = self.timers.pop().expect("peeked timer vanished");
            let now = self.now;
            self.trace.record(now, TraceEventKind::TimerFired, None);
            woken.push(entry.waker);
        }
        woken
    }
}

/// The ready queue shared with wakers. Holds only task identifiers, so it
/// stays `Send + Sync` even though stored futures are not.
pub(crate) struct ReadyQueue {
    queue: VecDeque<TaskId>,
    scheduled: HashSet<TaskId>,
    root_woken: bool,
}

impl ReadyQueue {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            scheduled: HashSet::new(),
            root_woken: false,
        }
    }

    /// Enqueues a task, deduplicating repeated wakes.
    pub(crate) fn schedule(&mut self, task: TaskId) {
        if self.scheduled.insert(task) {
            self.queue.push_back(task);
        }
    }

    fn pop(&mut self) -> Option<TaskId> {
        let task = self.queue.pop_front()?;
        self.scheduled.remove(&task);
        Some(task)
    }

    fn wake_root(&mut self) {
        self.root_woken = true;
    }

    fn take_root_woken(&mut self) -> bool {
        std::mem::take(&mut self.root_woken)
    }
}

/// Wakes a task by re-enqueueing its identifier.
struct TaskWaker {
    task: TaskId,
    ready: Arc<Mutex<ReadyQueue>>,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready
            .lock()
            .expect("lock poisoned")
            .schedule(self.task);
    }
}

/// Wakes the root future driven by [`Scheduler::block_on`].
struct RootWaker {
    ready: Arc<Mutex<ReadyQueue>>,
}

impl Wake for RootWaker {
    fn wake(self: Arc<Self>) {
        self.ready.lock().expect("lock poisoned").wake_root();
    }
}

/// The single-threaded cooperative scheduler.
///
/// Tasks are spawned through a [`Handle`] and polled in FIFO wake order.
/// When nothing is runnable and `auto_advance` is set, virtual time jumps
/// to the earliest pending timer deadline.
pub struct Scheduler {
    state: Arc<Mutex<State>>,
    ready: Arc<Mutex<ReadyQueue>>,
    config: SchedulerConfig,
    steps: u64,
    root_polls: u64,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates a scheduler with the given configuration.
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new(config.trace_capacity))),
            ready: Arc::new(Mutex::new(ReadyQueue::new())),
            config,
            steps: 0,
            root_polls: 0,
        }
    }

    /// Returns a cloneable handle for spawning tasks and creating timers.
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::new(Arc::clone(&self.state), Arc::clone(&self.ready))
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Time {
        self.state.lock().expect("lock poisoned").now
    }

    /// Returns the number of task polls executed so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the number of live (spawned, not yet completed) tasks.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.state.lock().expect("lock poisoned").slots.len()
    }

    /// Returns a copy of the retained trace events, oldest first.
    #[must_use]
    pub fn trace_snapshot(&self) -> Vec<TraceEvent> {
        self.state
            .lock()
            .expect("lock poisoned")
            .trace
            .iter()
            .cloned()
            .collect()
    }

    /// Renders the retained trace as JSON, for test artifacts.
    #[must_use]
    pub fn trace_json(&self) -> String {
        self.state.lock().expect("lock poisoned").trace.to_json()
    }

    /// Advances virtual time by `delta`, firing any timers that become due.
    pub fn advance_time(&mut self, delta: Duration) {
        let target = self.now() + delta;
        self.advance_time_to(target);
    }

    /// Advances virtual time to `target` (never backwards), firing any
    /// timers that become due.
    pub fn advance_time_to(&mut self, target: Time) {
        let woken = {
            let mut state = self.state.lock().expect("lock poisoned");
            if target > state.now {
                state.now = target;
                state.trace.record(target, TraceEventKind::TimeAdvance, None);
                tracing::trace!(now = %target, "time advance");
            }
            state.fire_due_timers()
        };
        for waker in woken {
            waker.wake();
        }
    }

    /// Polls one ready task. Returns false if the ready queue was empty.
    fn step(&mut self) -> bool {
        let Some(task) = self.ready.lock().expect("lock poisoned").pop() else {
            return false;
        };

        // Take the future out of the slot table so the state lock is not
        // held across the poll (the task may spawn or register timers).
        let Some(mut future) = ({
            let mut state = self.state.lock().expect("lock poisoned");
            let future = state.slots.remove(&task.as_u64());
            if future.is_some() {
                let now = state.now;
                state.trace.record(now, TraceEventKind::Poll, Some(task));
            }
            future
        }) else {
            // Stale wake for a task that already completed.
            return true;
        };

        self.steps += 1;
        let waker = Waker::from(Arc::new(TaskWaker {
            task,
            ready: Arc::clone(&self.ready),
        }));
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                let mut state = self.state.lock().expect("lock poisoned");
                let now = state.now;
                state.trace.record(now, TraceEventKind::Complete, Some(task));
                tracing::trace!(task = %task, "task complete");
            }
            Poll::Pending => {
                self.state
                    .lock()
                    .expect("lock poisoned")
                    .slots
                    .insert(task.as_u64(), future);
            }
        }
        true
    }

    /// Advances virtual time to the earliest pending timer, if any.
    fn advance_to_next_timer(&mut self) -> bool {
        let deadline = self.state.lock().expect("lock poisoned").next_deadline();
        deadline.is_some_and(|at| {
            self.advance_time_to(at);
            true
        })
    }

    fn step_limit_reached(&self) -> bool {
        self.config
            .max_steps
            .is_some_and(|max| self.steps.saturating_add(self.root_polls) >= max)
    }

    /// Runs until no task is runnable and no timer can make one runnable,
    /// or until the step limit is reached. Returns the number of task
    /// polls executed.
    pub fn run_until_quiescent(&mut self) -> u64 {
        let start = self.steps;
        loop {
            if self.step_limit_reached() {
                tracing::warn!(steps = self.steps, "step limit reached; giving up");
                break;
            }
            if self.step() {
                continue;
            }
            if self.config.auto_advance && self.advance_to_next_timer() {
                continue;
            }
            break;
        }
        self.steps - start
    }

    /// Drives `future` to completion alongside spawned tasks.
    ///
    /// # Panics
    ///
    /// Panics if the root future is pending while no task is runnable and
    /// no timer is registered (the future could never be woken again), or
    /// if the configured step limit is exceeded.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        let mut future = std::pin::pin!(future);
        let waker = Waker::from(Arc::new(RootWaker {
            ready: Arc::clone(&self.ready),
        }));
        let mut cx = Context::from_waker(&waker);

        self.ready.lock().expect("lock poisoned").wake_root();
        loop {
            assert!(
                !self.step_limit_reached(),
                "scheduler exceeded its step limit; a task or the root future is busy-waking"
            );

            if self.ready.lock().expect("lock poisoned").take_root_woken() {
                self.root_polls += 1;
                if let Poll::Ready(value) = future.as_mut().poll(&mut cx) {
                    return value;
                }
                continue;
            }
            if self.step() {
                continue;
            }
            if self.config.auto_advance && self.advance_to_next_timer() {
                continue;
            }
            panic!(
                "scheduler stalled: root future is pending but no task is runnable \
                 and no timer is registered"
            );
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("steps", &self.steps)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn spawned_tasks_run_to_completion() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = Rc::clone(&hits);
            drop(handle.spawn(async move { hits.set(hits.get() + 1) }));
        }

        assert_eq!(scheduler.pending_tasks(), 3);
        scheduler.run_until_quiescent();
        assert_eq!(hits.get(), 3);
        assert_eq!(scheduler.pending_tasks(), 0);
    }

    #[test]
    fn spawn_order_is_poll_order() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for i in 0..4 {
            let order = Rc::clone(&order);
            drop(handle.spawn(async move { order.borrow_mut().push(i) }));
        }
        scheduler.run_until_quiescent();
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn block_on_returns_root_value() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let child = handle.spawn(async { 41 });
        let value = scheduler.block_on(async move { child.await + 1 });
        assert_eq!(value, 42);
    }

    #[test]
    fn virtual_time_advances_to_timers() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let h = handle.clone();
        let done_at = scheduler.block_on(async move {
            h.sleep(Duration::from_millis(25)).await;
            h.now()
        });
        assert_eq!(done_at, Time::from_millis(25));
        assert_eq!(scheduler.now(), Time::from_millis(25));
    }

    #[test]
    fn same_deadline_timers_fire_in_registration_order() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = Rc::clone(&order);
            let h = handle.clone();
            drop(handle.spawn(async move {
                h.sleep(Duration::from_millis(10)).await;
                order.borrow_mut().push(i);
            }));
        }
        scheduler.run_until_quiescent();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn manual_time_control_without_auto_advance() {
        init_test_logging();
        let mut scheduler =
            Scheduler::with_config(SchedulerConfig::default().auto_advance(false));
        let handle = scheduler.handle();

        let h = handle.clone();
        let slept = handle.spawn(async move {
            h.sleep(Duration::from_millis(5)).await;
            true
        });

        scheduler.run_until_quiescent();
        assert!(!slept.is_finished());

        scheduler.advance_time(Duration::from_millis(5));
        scheduler.run_until_quiescent();
        assert!(slept.is_finished());
    }

    #[test]
    fn trace_records_spawn_poll_complete() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        drop(handle.spawn(async {}));
        scheduler.run_until_quiescent();

        let kinds: Vec<TraceEventKind> =
            scheduler.trace_snapshot().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TraceEventKind::Spawn,
                TraceEventKind::Poll,
                TraceEventKind::Complete
            ]
        );
    }

    #[test]
    fn run_until_quiescent_counts_steps() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();
        drop(handle.spawn(async {}));
        drop(handle.spawn(async {}));

        let polls = scheduler.run_until_quiescent();
        assert_eq!(polls, 2);
        assert_eq!(scheduler.steps(), 2);
    }

    #[test]
    #[should_panic(expected = "scheduler stalled")]
    fn block_on_panics_when_root_can_never_wake() {
        let mut scheduler = Scheduler::new();
        scheduler.block_on(std::future::pending::<()>());
    }
}
