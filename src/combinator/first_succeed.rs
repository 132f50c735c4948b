//! First-succeed combinator: the first fulfilled value wins.
//!
//! # Semantics
//!
//! ```text
//! first_succeed([t1, ..., tn]):
//!   spawn every task in input order
//!   resolve with the first fulfilled value any task produces
//!   a rejection is recorded and otherwise ignored
//!   if every task rejects -> fail with all errors, in input order
//! ```
//!
//! # Distinction from First-Settle
//!
//! - **first_settle**: first to *settle* wins, regardless of outcome kind
//! - **first_succeed**: first to *fulfill* wins; rejections only matter
//!   when they are unanimous
//!
//! Once a winner is found, tasks still running are neither awaited nor
//! cancelled; they run detached and their results are discarded. The
//! aggregate error on the all-reject path lists every rejection in input
//! order, regardless of the order in which the rejections arrived.
//!
//! An empty collection fails immediately with [`CombineError::Empty`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::combinator::{launch, ChildSlot};
use crate::error::{AggregateFailure, CombineError};
use crate::runtime::Handle;
use crate::task::Task;
use crate::types::{Outcome, Policy};

/// The winner of a first-succeed combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSucceeded<T> {
    /// Input index of the first task to fulfill.
    pub index: usize,
    /// The fulfilled value.
    pub value: T,
}

/// Combines `tasks` so that the first fulfillment wins.
///
/// All tasks are spawned, in input order, before this function returns.
pub fn first_succeed<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>) -> FirstSucceed<T, E>
where
    T: 'static,
    E: 'static,
{
    FirstSucceed {
        children: launch(handle, tasks),
    }
}

/// Future returned by [`first_succeed`].
pub struct FirstSucceed<T, E> {
    children: Vec<ChildSlot<T, E>>,
}

// The slot table is plain storage; nothing behind it is pinned.
impl<T, E> Unpin for FirstSucceed<T, E> {}

impl<T, E> Future for FirstSucceed<T, E> {
    type Output = Result<FirstSucceeded<T>, CombineError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.children.is_empty() {
            return Poll::Ready(Err(CombineError::Empty(Policy::FirstSucceed)));
        }

        let mut all_settled = true;
        for (index, slot) in this.children.iter_mut().enumerate() {
            slot.poll_progress(cx);
            if slot.settled_fulfilled() {
                let Outcome::Fulfilled(value) = slot.take_settled() else {
                    unreachable!("slot was observed fulfilled");
                };
                return Poll::Ready(Ok(FirstSucceeded { index, value }));
            }
            // Rejections stay parked until the verdict is unanimous.
            if slot.is_pending() {
                all_settled = false;
            }
        }

        if all_settled {
            let errors = this
                .children
                .iter_mut()
                .map(|slot| match slot.take_settled() {
                    Outcome::Rejected(error) => error,
                    Outcome::Fulfilled(_) => unreachable!("fulfillments resolve the combinator"),
                })
                .collect();
            return Poll::Ready(Err(CombineError::Aggregate(AggregateFailure::new(errors))));
        }
        Poll::Pending
    }
}
