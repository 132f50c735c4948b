//! All-succeed combinator: wait for everything, fail fast on rejection.
//!
//! # Semantics
//!
//! ```text
//! all_succeed([t1, ..., tn]):
//!   spawn every task in input order
//!   wait until either:
//!     - some task rejects  -> fail with that task's error (index + error);
//!                             fulfilled values observed so far are discarded
//!     - every task fulfills -> return the values in input order
//! ```
//!
//! Failure is driven by completion order: the combinator resolves on the
//! poll in which a rejection is first observed, without waiting for the
//! remaining tasks. Those tasks keep running detached; their results are
//! discarded.
//!
//! An empty collection resolves to an empty vector on the first poll, with
//! no tasks spawned and no suspension.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::combinator::{launch, ChildSlot};
use crate::error::TaskFailure;
use crate::runtime::Handle;
use crate::task::Task;
use crate::types::Outcome;

/// Combines `tasks` so that every one must fulfill.
///
/// All tasks are spawned, in input order, before this function returns.
pub fn all_succeed<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>) -> AllSucceed<T, E>
where
    T: 'static,
    E: 'static,
{
    AllSucceed {
        children: launch(handle, tasks),
    }
}

/// Future returned by [`all_succeed`].
///
/// Resolves to the fulfilled values in input order, or to the first
/// observed [`TaskFailure`].
pub struct AllSucceed<T, E> {
    children: Vec<ChildSlot<T, E>>,
}

// The slot table is plain storage; nothing behind it is pinned.
impl<T, E> Unpin for AllSucceed<T, E> {}

impl<T, E> Future for AllSucceed<T, E> {
    type Output = Result<Vec<T>, TaskFailure<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut all_settled = true;

        for (index, slot) in this.children.iter_mut().enumerate() {
            slot.poll_progress(cx);
            if slot.settled_rejected() {
                let Outcome::Rejected(error) = slot.take_settled() else {
                    unreachable!("slot was observed rejected");
                };
                return Poll::Ready(Err(TaskFailure::new(index, error)));
            }
            if slot.is_pending() {
                all_settled = false;
            }
        }

        if all_settled {
            let values = this
                .children
                .iter_mut()
                .map(|slot| match slot.take_settled() {
                    Outcome::Fulfilled(value) => value,
                    Outcome::Rejected(_) => unreachable!("rejections resolve the combinator"),
                })
                .collect();
            return Poll::Ready(Ok(values));
        }
        Poll::Pending
    }
}
