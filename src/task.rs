//! The opaque asynchronous producer abstraction.
//!
//! A [`Task`] is one unit of asynchronous work yielding a single
//! [`Outcome`]. Combinators identify tasks only by their position in the
//! input collection, observe each task exactly once to completion, and
//! discard it afterwards.
//!
//! # Semantics
//!
//! - A task is created by the caller and carries no scheduling state of
//!   its own; spawning happens when a combinator launches it.
//! - A producer that panics synchronously, before yielding an asynchronous
//!   handle, becomes an immediately-rejected task (see
//!   [`Task::from_producer`]). Panics inside an already-running task are
//!   not intercepted.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use core::fmt;

use crate::types::Outcome;

/// The boxed future a task wraps.
type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Outcome<T, E>>>>;

/// One unit of asynchronous work yielding a single [`Outcome`].
pub struct Task<T, E> {
    future: TaskFuture<T, E>,
}

impl<T, E> Task<T, E> {
    /// Wraps a future that resolves to an [`Outcome`].
    #[must_use]
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T, E>> + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }

    /// Wraps a future that resolves to a `Result`, mapping `Ok` to
    /// `Fulfilled` and `Err` to `Rejected`.
    #[must_use]
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + 'static,
        T: 'static,
        E: 'static,
    {
        Self::new(async move { future.await.into() })
    }

    /// A task that settles immediately with the given outcome.
    #[must_use]
    pub fn settled(outcome: Outcome<T, E>) -> Self
    where
        T: 'static,
        E: 'static,
    {
        Self::new(std::future::ready(outcome))
    }

    /// A task that fulfills immediately with `value`.
    #[must_use]
    pub fn fulfilled(value: T) -> Self
    where
        T: 'static,
        E: 'static,
    {
        Self::new(std::future::ready(Outcome::Fulfilled(value)))
    }

    /// A task that rejects immediately with `error`.
    #[must_use]
    pub fn rejected(error: E) -> Self
    where
        T: 'static,
        E: 'static,
    {
        Self::new(std::future::ready(Outcome::Rejected(error)))
    }

    /// Invokes `producer` to obtain the task's future, converting a
    /// synchronous panic into an immediately-rejected task.
    ///
    /// The producer runs at construction time, so any side effects it has
    /// are ordered before the task is launched. A panic during that call
    /// is caught and surfaced as `Rejected(E::from(ProducerPanic))`; the
    /// combination proceeds with the other tasks.
    #[must_use]
    pub fn from_producer<P, F>(producer: P) -> Self
    where
        P: FnOnce() -> F,
        F: Future<Output = Outcome<T, E>> + 'static,
        T: 'static,
        E: From<ProducerPanic> + 'static,
    {
        match std::panic::catch_unwind(AssertUnwindSafe(producer)) {
            Ok(future) => Self::new(future),
            Err(payload) => Self::rejected(E::from(ProducerPanic::from_payload(&*payload))),
        }
    }
}

impl<T, E> Future for Task<T, E> {
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Payload from a producer that panicked before yielding a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerPanic {
    message: String,
}

impl ProducerPanic {
    /// Creates a panic record with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a readable message from a caught panic payload.
    #[must_use]
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&'static str>().map(|s| (*s).to_string()))
            .unwrap_or_else(|| "opaque panic payload".to_string());
        Self { message }
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProducerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer panicked: {}", self.message)
    }
}

impl std::error::Error for ProducerPanic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::poll_once;

    #[test]
    fn fulfilled_resolves_immediately() {
        let mut task: Task<i32, &str> = Task::fulfilled(42);
        assert_eq!(poll_once(&mut task), Poll::Ready(Outcome::Fulfilled(42)));
    }

    #[test]
    fn rejected_resolves_immediately() {
        let mut task: Task<i32, &str> = Task::rejected("boom");
        assert_eq!(poll_once(&mut task), Poll::Ready(Outcome::Rejected("boom")));
    }

    #[test]
    fn from_future_maps_result() {
        let mut ok: Task<i32, String> = Task::from_future(async { Ok(7) });
        assert_eq!(poll_once(&mut ok), Poll::Ready(Outcome::Fulfilled(7)));

        let mut err: Task<i32, String> = Task::from_future(async { Err("no".to_string()) });
        assert_eq!(
            poll_once(&mut err),
            Poll::Ready(Outcome::Rejected("no".to_string()))
        );
    }

    #[test]
    fn producer_runs_at_construction() {
        let mut ran = false;
        let task: Task<i32, ProducerPanic> = Task::from_producer(|| {
            ran = true;
            std::future::ready(Outcome::Fulfilled(1))
        });
        assert!(ran);
        drop(task);
    }

    #[test]
    fn panicking_producer_becomes_immediate_rejection() {
        let mut task: Task<i32, ProducerPanic> =
            Task::from_producer(|| -> std::future::Ready<Outcome<i32, ProducerPanic>> {
                panic!("exploded before any handle existed")
            });

        match poll_once(&mut task) {
            Poll::Ready(Outcome::Rejected(panic)) => {
                assert_eq!(panic.message(), "exploded before any handle existed");
            }
            other => panic!("expected immediate rejection, got {other:?}"),
        }
    }

    #[test]
    fn panic_payload_extraction() {
        let string_payload: Box<dyn std::any::Any + Send> = Box::new("literal");
        assert_eq!(
            ProducerPanic::from_payload(string_payload.as_ref()).message(),
            "literal"
        );

        let owned_payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(
            ProducerPanic::from_payload(owned_payload.as_ref()).message(),
            "owned"
        );

        let opaque_payload: Box<dyn std::any::Any + Send> = Box::new(17_u32);
        assert_eq!(
            ProducerPanic::from_payload(opaque_payload.as_ref()).message(),
            "opaque panic payload"
        );
    }

    #[test]
    fn producer_panic_display() {
        let panic = ProducerPanic::new("boom");
        assert_eq!(panic.to_string(), "producer panicked: boom");
    }
}
