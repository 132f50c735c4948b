//! All-settle combinator: wait for everything, failures are data.
//!
//! # Semantics
//!
//! ```text
//! all_settle([t1, ..., tn]):
//!   spawn every task in input order
//!   wait for every task to settle
//!   return one outcome per task, in input order
//! ```
//!
//! This combinator never fails: rejections are returned alongside
//! fulfillments as [`Outcome`] values. An empty collection resolves to an
//! empty vector on the first poll, with no tasks spawned and no
//! suspension.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::combinator::{launch, ChildSlot};
use crate::runtime::Handle;
use crate::task::Task;
use crate::types::Outcome;

/// Combines `tasks`, observing every one to completion unconditionally.
///
/// All tasks are spawned, in input order, before this function returns.
pub fn all_settle<T, E>(handle: &Handle, tasks: Vec<Task<T, E>>) -> AllSettle<T, E>
where
    T: 'static,
    E: 'static,
{
    AllSettle {
        children: launch(handle, tasks),
    }
}

/// Future returned by [`all_settle`]. Resolves to one [`Outcome`] per
/// task, in input order. Infallible.
pub struct AllSettle<T, E> {
    children: Vec<ChildSlot<T, E>>,
}

// The slot table is plain storage; nothing behind it is pinned.
impl<T, E> Unpin for AllSettle<T, E> {}

impl<T, E> Future for AllSettle<T, E> {
    type Output = Vec<Outcome<T, E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut all_settled = true;

        for slot in &mut this.children {
            slot.poll_progress(cx);
            if slot.is_pending() {
                all_settled = false;
            }
        }

        if all_settled {
            let outcomes = this
                .children
                .iter_mut()
                .map(ChildSlot::take_settled)
                .collect();
            return Poll::Ready(outcomes);
        }
        Poll::Pending
    }
}
