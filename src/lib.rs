//! Settle: policy-driven combination of independent asynchronous tasks.
//!
//! # Overview
//!
//! Settle takes a collection of independently-producible asynchronous
//! results ([`Task`]s) and composes them under one of four combination
//! policies:
//!
//! - [`Policy::AllSucceed`]: wait for every task; the first rejection fails
//!   the whole combination with that task's error
//! - [`Policy::AllSettle`]: wait for every task unconditionally; failures
//!   are data, never errors
//! - [`Policy::FirstSettle`]: resolve with the first outcome of any kind
//! - [`Policy::FirstSucceed`]: resolve with the first fulfilled value,
//!   ignoring rejections unless every task rejects
//!
//! # Core Guarantees
//!
//! - **Input-order results**: `AllSucceed`/`AllSettle` results are ordered
//!   by input position, independent of completion order
//! - **Synchronous launch**: every task is spawned, in input order, before
//!   a combinator first suspends
//! - **No cancellation**: tasks left behind by an early-resolving policy
//!   run to completion on the scheduler with their results discarded
//! - **Deterministic testing**: the scheduler is single-threaded with
//!   virtual time, so timing-sensitive combinations replay identically
//!
//! # Module Structure
//!
//! - [`types`]: Core types (outcomes, policies, identifiers, virtual time)
//! - [`task`]: The opaque asynchronous producer abstraction
//! - [`runtime`]: Single-threaded cooperative scheduler with virtual time
//! - [`combinator`]: The four combination policies and the uniform surface
//! - [`config`]: Scheduler configuration and environment overrides
//! - [`trace`]: Bounded capture of scheduler events
//! - [`error`]: Error types for the combination surface
//! - [`test_utils`]: Shared helpers for unit and integration tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod combinator;
pub mod config;
pub mod error;
pub mod runtime;
pub mod task;
pub mod test_utils;
pub mod trace;
pub mod types;

// Re-exports for convenient access to the core surface
pub use combinator::{
    all_settle, all_succeed, combine, first_settle, first_succeed, Combine, Combined,
    FirstSettled, FirstSucceeded,
};
pub use config::{ConfigError, SchedulerConfig};
pub use error::{AggregateFailure, CombineError, TaskFailure};
pub use runtime::{Handle, Scheduler, Sleep, TaskHandle};
pub use task::{ProducerPanic, Task};
pub use trace::{TraceBuffer, TraceEvent, TraceEventKind};
pub use types::{Outcome, Policy, TaskId, Time};
