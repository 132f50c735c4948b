//! Spawning handles and task completion cells.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use crate::runtime::scheduler::{ReadyQueue, State};
use crate::runtime::sleep::Sleep;
use crate::trace::TraceEventKind;
use crate::types::{TaskId, Time};

/// A cloneable handle to the scheduler, used to spawn tasks and create
/// timers from anywhere, including from inside running tasks.
#[derive(Clone)]
pub struct Handle {
    state: Arc<Mutex<State>>,
    ready: Arc<Mutex<ReadyQueue>>,
}

impl Handle {
    pub(crate) fn new(state: Arc<Mutex<State>>, ready: Arc<Mutex<ReadyQueue>>) -> Self {
        Self { state, ready }
    }

    /// Spawns a future onto the scheduler and returns a handle to its
    /// result.
    ///
    /// The task is enqueued immediately; the first poll happens on the
    /// next scheduler step. Spawn order is therefore both launch order and
    /// first-poll order.
    pub fn spawn<T, F>(&self, future: F) -> TaskHandle<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        let cell = Arc::new(Mutex::new(Completion::new()));
        let id = {
            let mut state = self.state.lock().expect("lock poisoned");
            let id = state.allocate_task();
            let done = Arc::clone(&cell);
            let wrapper = async move {
                let value = future.await;
                Completion::complete(&done, value);
            };
            state.slots.insert(id.as_u64(), Box::pin(wrapper));
            let now = state.now;
            state.trace.record(now, TraceEventKind::Spawn, Some(id));
            id
        };
        tracing::trace!(task = %id, "spawn");
        self.ready.lock().expect("lock poisoned").schedule(id);
        TaskHandle { id, cell }
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Time {
        self.state.lock().expect("lock poisoned").now
    }

    /// Returns a future that completes once `duration` of virtual time has
    /// passed.
    #[must_use]
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.sleep_until(self.now() + duration)
    }

    /// Returns a future that completes once virtual time reaches
    /// `deadline`.
    #[must_use]
    pub fn sleep_until(&self, deadline: Time) -> Sleep {
        Sleep::new(self.clone(), deadline)
    }

    pub(crate) fn register_timer(&self, at: Time, waker: Waker) {
        self.state
            .lock()
            .expect("lock poisoned")
            .register_timer(at, waker);
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").finish_non_exhaustive()
    }
}

/// Where a task delivers its result.
struct Completion<T> {
    value: Option<T>,
    waker: Option<Waker>,
    done: bool,
}

impl<T> Completion<T> {
    const fn new() -> Self {
        Self {
            value: None,
            waker: None,
            done: false,
        }
    }

    /// Stores the task's result and wakes the waiter, if any.
    fn complete(cell: &Arc<Mutex<Self>>, value: T) {
        let waker = {
            let mut completion = cell.lock().expect("lock poisoned");
            completion.value = Some(value);
            completion.done = true;
            completion.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// An owned handle to a spawned task's eventual result.
///
/// Awaiting the handle yields the task's output. Dropping the handle
/// detaches the task: it keeps running on the scheduler and its result is
/// discarded on completion. The result is delivered exactly once; polling
/// a handle after it has yielded panics.
pub struct TaskHandle<T> {
    id: TaskId,
    cell: Arc<Mutex<Completion<T>>>,
}

impl<T> TaskHandle<T> {
    /// Returns the identifier of the spawned task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.id
    }

    /// Returns true if the task has completed (whether or not the result
    /// has been taken).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cell.lock().expect("lock poisoned").done
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut completion = self.cell.lock().expect("lock poisoned");
        if let Some(value) = completion.value.take() {
            return Poll::Ready(value);
        }
        assert!(
            !completion.done,
            "task result already taken: {} delivers exactly once",
            self.id
        );
        completion.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Scheduler;
    use crate::test_utils::init_test_logging;

    #[test]
    fn handle_resolves_to_task_output() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let task = handle.spawn(async { "done" });
        let id = task.task_id();
        assert!(!task.is_finished());

        let value = scheduler.block_on(task);
        assert_eq!(value, "done");
        assert_eq!(id, TaskId::from_raw(0));
    }

    #[test]
    fn task_ids_are_sequential() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let a = handle.spawn(async {});
        let b = handle.spawn(async {});
        assert!(a.task_id() < b.task_id());
    }

    #[test]
    fn dropped_handle_detaches_without_stopping_the_task() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let witness = std::rc::Rc::new(std::cell::Cell::new(false));
        let inner = std::rc::Rc::clone(&witness);
        drop(handle.spawn(async move { inner.set(true) }));

        scheduler.run_until_quiescent();
        assert!(witness.get(), "detached task still ran to completion");
    }

    #[test]
    fn spawning_from_inside_a_task_works() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let h = handle.clone();
        let value = scheduler.block_on(async move {
            let nested = h.spawn(async { 5 });
            nested.await
        });
        assert_eq!(value, 5);
    }

    #[test]
    #[should_panic(expected = "task result already taken")]
    fn polling_after_delivery_panics() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let mut task = handle.spawn(async { 1 });
        scheduler.run_until_quiescent();

        let _first = crate::test_utils::poll_once(&mut task);
        let _second = crate::test_utils::poll_once(&mut task);
    }
}
