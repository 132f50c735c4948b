//! Test utilities shared by unit and integration tests.
//!
//! This module provides:
//! - Consistent tracing-based logging initialization
//! - A one-shot poll helper with a no-op waker
//! - Controllable futures (never settling, poll counting)
//! - Timed task constructors over virtual time

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use crate::runtime::Handle;
use crate::task::Task;
use crate::types::Outcome;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

/// Returns a waker that does nothing when woken.
#[must_use]
pub fn noop_waker() -> Waker {
    Waker::from(Arc::new(NoopWake))
}

/// Polls a future exactly once with a no-op waker.
pub fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    Pin::new(future).poll(&mut cx)
}

/// A task that never settles.
#[must_use]
pub fn never_task<T: 'static, E: 'static>() -> Task<T, E> {
    Task::new(std::future::pending())
}

/// A task that settles with `outcome` after `delay` of virtual time.
#[must_use]
pub fn timed_task<T: 'static, E: 'static>(
    handle: &Handle,
    delay: Duration,
    outcome: Outcome<T, E>,
) -> Task<T, E> {
    let handle = handle.clone();
    Task::new(async move {
        handle.sleep(delay).await;
        outcome
    })
}

/// Counter for tracking poll counts and other metrics.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU32,
}

impl Counter {
    /// Create a new shared counter.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU32::new(0),
        })
    }

    /// Increment the counter.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Get the current count.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

/// A future that completes after a specified number of polls, self-waking
/// between polls.
pub struct CompleteAfterPolls {
    polls_remaining: u32,
    poll_counter: Arc<Counter>,
}

impl CompleteAfterPolls {
    /// Create a future that completes after `n` additional polls.
    #[must_use]
    pub fn new(n: u32, counter: Arc<Counter>) -> Self {
        Self {
            polls_remaining: n,
            poll_counter: counter,
        }
    }
}

impl Future for CompleteAfterPolls {
    type Output = u32;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.poll_counter.increment();
        if self.polls_remaining == 0 {
            Poll::Ready(self.poll_counter.get())
        } else {
            self.polls_remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
