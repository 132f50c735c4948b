//! Combination policies over task collections.
//!
//! This module provides the four combinators:
//!
//! - [`all_succeed`]: wait for every task, fail fast on the first rejection
//! - [`all_settle`]: wait for every task, failures are data
//! - [`first_settle`]: first outcome of any kind wins
//! - [`first_succeed`]: first fulfilled value wins, rejections aggregate
//!
//! and the uniform surface [`combine`], which dispatches on a
//! [`Policy`] value and folds every result into [`Combined`].
//!
//! # Launch Semantics
//!
//! Every combinator spawns all of its tasks at construction, in input
//! order, before it can first suspend. Launch is synchronous and
//! side-effect-ordered: by the time a combinator is first polled, each
//! task already occupies a scheduler slot, and the FIFO ready queue polls
//! them in input order.
//!
//! # Losers Are Not Cancelled
//!
//! `first_settle` and `first_succeed` resolve while other tasks may still
//! be running. Those tasks are left on the scheduler, run to completion,
//! and have their results discarded. This mirrors the absence of any
//! cancellation primitive in the runtime.
//!
//! # Completion Ties
//!
//! If several tasks settle between two combinator polls, the task with
//! the lowest input index is observed first. Under the single-threaded
//! scheduler this tie-break is deterministic.

pub mod all_settle;
pub mod all_succeed;
pub mod first_settle;
pub mod first_succeed;

pub use all_settle::{all_settle, AllSettle};
pub use all_succeed::{all_succeed, AllSucceed};
pub use first_settle::{first_settle, FirstSettle, FirstSettled};
pub use first_succeed::{first_succeed, FirstSucceed, FirstSucceeded};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::CombineError;
use crate::runtime::{Handle, TaskHandle};
use crate::task::Task;
use crate::types::{Outcome, Policy};

/// The observation state of one launched task inside a combinator.
pub(crate) enum ChildSlot<T, E> {
    /// Still running; the handle is polled on every combinator poll.
    Pending(TaskHandle<Outcome<T, E>>),
    /// Settled; the outcome is parked here until the combinator folds it.
    Settled(Outcome<T, E>),
    /// The outcome has been moved into a result.
    Taken,
}

impl<T, E> ChildSlot<T, E> {
    /// Moves a pending slot to settled if its task has completed.
    pub(crate) fn poll_progress(&mut self, cx: &mut Context<'_>) {
        if let Self::Pending(handle) = self {
            if let Poll::Ready(outcome) = Pin::new(handle).poll(cx) {
                *self = Self::Settled(outcome);
            }
        }
    }

    /// Returns true if the task has not settled yet.
    pub(crate) const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns true if a settled outcome is parked in the slot.
    pub(crate) const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }

    /// Returns true if the slot holds a fulfilled outcome.
    pub(crate) fn settled_fulfilled(&self) -> bool {
        matches!(self, Self::Settled(outcome) if outcome.is_fulfilled())
    }

    /// Returns true if the slot holds a rejected outcome.
    pub(crate) fn settled_rejected(&self) -> bool {
        matches!(self, Self::Settled(outcome) if outcome.is_rejected())
    }

    /// Takes the settled outcome out of the slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not settled; combinators only call this after
    /// observing settlement.
    pub(crate) fn take_settled(&mut self) -> Outcome<T, E> {
        match std::mem::replace(self, Self::Taken) {
            Self::Settled(outcome) => outcome,
            Self::Pending(_) | Self::Taken => {
                panic!("combinator consumed a slot that has no settled outcome")
            }
        }
    }
}

/// Spawns every task in input order and wraps each in a [`ChildSlot`].
pub(crate) fn launch<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>) -> Vec<ChildSlot<T, E>>
where
    T: 'static,
    E: 'static,
{
    tasks
        .into_iter()
        .map(|task| ChildSlot::Pending(handle.spawn(task)))
        .collect()
}

/// The policy-dependent aggregate produced by [`combine`].
#[derive(Debug)]
pub enum Combined<T, E> {
    /// Every task fulfilled; values in input order.
    AllSucceeded(Vec<T>),
    /// Every task settled; one outcome per task in input order.
    AllSettled(Vec<Outcome<T, E>>),
    /// The first task to settle, with its outcome as-is.
    FirstSettled(FirstSettled<T, E>),
    /// The first task to fulfill.
    FirstSucceeded(FirstSucceeded<T>),
}

impl<T, E> Combined<T, E> {
    /// Returns the policy that produced this aggregate.
    #[must_use]
    pub const fn policy(&self) -> Policy {
        match self {
            Self::AllSucceeded(_) => Policy::AllSucceed,
            Self::AllSettled(_) => Policy::AllSettle,
            Self::FirstSettled(_) => Policy::FirstSettle,
            Self::FirstSucceeded(_) => Policy::FirstSucceed,
        }
    }
}

/// Combines `tasks` under `policy`.
///
/// This is the uniform surface over the four typed combinators; prefer
/// those when the policy is known at compile time. All tasks are spawned
/// in input order before the returned future can suspend.
pub fn combine<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>, policy: Policy) -> Combine<T, E>
where
    T: 'static,
    E: 'static,
{
    let inner = match policy {
        Policy::AllSucceed => CombineInner::AllSucceed(all_succeed(handle, tasks)),
        Policy::AllSettle => CombineInner::AllSettle(all_settle(handle, tasks)),
        Policy::FirstSettle => CombineInner::FirstSettle(first_settle(handle, tasks)),
        Policy::FirstSucceed => CombineInner::FirstSucceed(first_succeed(handle, tasks)),
    };
    Combine { inner }
}

/// Future returned by [`combine`].
pub struct Combine<T, E> {
    inner: CombineInner<T, E>,
}

enum CombineInner<T, E> {
    AllSucceed(AllSucceed<T, E>),
    AllSettle(AllSettle<T, E>),
    FirstSettle(FirstSettle<T, E>),
    FirstSucceed(FirstSucceed<T, E>),
}

impl<T, E> Unpin for Combine<T, E> {}

impl<T, E> Future for Combine<T, E> {
    type Output = Result<Combined<T, E>, CombineError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            CombineInner::AllSucceed(f) => Pin::new(f)
                .poll(cx)
                .map(|r| r.map(Combined::AllSucceeded).map_err(CombineError::from)),
            CombineInner::AllSettle(f) => {
                Pin::new(f).poll(cx).map(|v| Ok(Combined::AllSettled(v)))
            }
            CombineInner::FirstSettle(f) => {
                Pin::new(f).poll(cx).map(|r| r.map(Combined::FirstSettled))
            }
            CombineInner::FirstSucceed(f) => {
                Pin::new(f).poll(cx).map(|r| r.map(Combined::FirstSucceeded))
            }
        }
    }
}

impl<T, E> std::fmt::Debug for Combine<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policy = match &self.inner {
            CombineInner::AllSucceed(_) => Policy::AllSucceed,
            CombineInner::AllSettle(_) => Policy::AllSettle,
            CombineInner::FirstSettle(_) => Policy::FirstSettle,
            CombineInner::FirstSucceed(_) => Policy::FirstSucceed,
        };
        f.debug_struct("Combine").field("policy", &policy).finish()
    }
}
