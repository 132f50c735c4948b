//! First-settle combinator: the first outcome of any kind wins.
//!
//! # Semantics
//!
//! ```text
//! first_settle([t1, ..., tn]):
//!   spawn every task in input order
//!   resolve with the first outcome any task produces,
//!   fulfilled or rejected, as-is
//! ```
//!
//! The winner's outcome is not interpreted: a rejection wins a race just
//! as a fulfillment does. The remaining tasks are neither awaited nor
//! cancelled; they keep running detached and their results are discarded.
//!
//! An empty collection fails immediately with
//! [`CombineError::Empty`], since no task could ever settle it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::combinator::{launch, ChildSlot};
use crate::error::CombineError;
use crate::runtime::Handle;
use crate::task::Task;
use crate::types::{Outcome, Policy};

/// The winner of a first-settle combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSettled<T, E> {
    /// Input index of the first task to settle.
    pub index: usize,
    /// That task's outcome, untouched.
    pub outcome: Outcome<T, E>,
}

/// Combines `tasks` so that the first settlement of any kind wins.
///
/// All tasks are spawned, in input order, before this function returns.
pub fn first_settle<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>) -> FirstSettle<T, E>
where
    T: 'static,
    E: 'static,
{
    FirstSettle {
        children: launch(handle, tasks),
    }
}

/// Future returned by [`first_settle`].
pub struct FirstSettle<T, E> {
    children: Vec<ChildSlot<T, E>>,
}

// The slot table is plain storage; nothing behind it is pinned.
impl<T, E> Unpin for FirstSettle<T, E> {}

impl<T, E> Future for FirstSettle<T, E> {
    type Output = Result<FirstSettled<T, E>, CombineError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.children.is_empty() {
            return Poll::Ready(Err(CombineError::Empty(Policy::FirstSettle)));
        }

        for (index, slot) in this.children.iter_mut().enumerate() {
            slot.poll_progress(cx);
            if slot.is_settled() {
                let outcome = slot.take_settled();
                return Poll::Ready(Ok(FirstSettled { index, outcome }));
            }
        }
        Poll::Pending
    }
}
