//! Single-threaded cooperative scheduler with virtual time.
//!
//! The runtime executes tasks with:
//! - One control flow: tasks are logically concurrent but interleave via
//!   suspension points; there is no parallelism
//! - A FIFO ready queue shared with wakers, so spawn order is poll order
//! - Virtual time: timers fire by advancing a counter, never by sleeping
//! - Trace capture of spawn/poll/complete/timer events
//!
//! # No Cancellation
//!
//! There is no cancellation primitive. Dropping a [`TaskHandle`] detaches
//! the task: it stays on the scheduler and runs to completion with its
//! result discarded. Combinators that resolve early (first-settle,
//! first-succeed) rely on exactly this behavior: losers are left running,
//! not cancelled. No resources are held beyond normal task lifetime.

mod handle;
mod scheduler;
mod sleep;

pub use handle::{Handle, TaskHandle};
pub use scheduler::Scheduler;
pub use sleep::Sleep;
