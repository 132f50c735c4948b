//! Sleep future over virtual time.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::runtime::handle::Handle;
use crate::types::Time;

/// A future that completes once virtual time reaches its deadline.
///
/// Created via [`Handle::sleep`] or [`Handle::sleep_until`]. The deadline
/// is fixed at creation. Dropping a `Sleep` simply stops the wait; the
/// registered timer fires into a dead waker with no other effect.
pub struct Sleep {
    handle: Handle,
    deadline: Time,
    registered: bool,
}

impl Sleep {
    pub(crate) fn new(handle: Handle, deadline: Time) -> Self {
        Self {
            handle,
            deadline,
            registered: false,
        }
    }

    /// Returns the absolute deadline of this sleep.
    #[must_use]
    pub const fn deadline(&self) -> Time {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.handle.now() >= this.deadline {
            return Poll::Ready(());
        }
        if !this.registered {
            // Wakers are stable per task in this runtime, so a single
            // registration covers every subsequent poll.
            this.handle.register_timer(this.deadline, cx.waker().clone());
            this.registered = true;
        }
        Poll::Pending
    }
}

impl std::fmt::Debug for Sleep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("registered", &self.registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Scheduler;
    use crate::test_utils::init_test_logging;
    use std::time::Duration;

    #[test]
    fn zero_duration_sleep_is_immediately_ready() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        scheduler.block_on(handle.sleep(Duration::ZERO));
        assert_eq!(scheduler.now(), Time::ZERO);
    }

    #[test]
    fn sleep_completes_at_its_deadline() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let sleep = handle.sleep(Duration::from_millis(30));
        assert_eq!(sleep.deadline(), Time::from_millis(30));

        scheduler.block_on(sleep);
        assert_eq!(scheduler.now(), Time::from_millis(30));
    }

    #[test]
    fn sequential_sleeps_accumulate() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        let h = handle.clone();
        scheduler.block_on(async move {
            h.sleep(Duration::from_millis(10)).await;
            h.sleep(Duration::from_millis(10)).await;
        });
        assert_eq!(scheduler.now(), Time::from_millis(20));
    }

    #[test]
    fn sleep_until_a_past_deadline_is_ready() {
        init_test_logging();
        let mut scheduler = Scheduler::new();
        let handle = scheduler.handle();

        scheduler.advance_time(Duration::from_millis(50));
        scheduler.block_on(handle.sleep_until(Time::from_millis(20)));
        assert_eq!(scheduler.now(), Time::from_millis(50));
    }
}
