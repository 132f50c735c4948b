//! Bounded capture of scheduler events.
//!
//! The trace buffer stores recent scheduler events in a fixed-size ring,
//! allowing capture without unbounded memory growth. Events carry a
//! monotonic sequence number and the virtual time at which they occurred,
//! so tests can assert ordering properties (spawn order, completion order,
//! time advancement) directly against the trace.

use serde::Serialize;

use crate::types::{TaskId, Time};

/// The kind of trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceEventKind {
    /// A task was spawned onto the scheduler.
    Spawn,
    /// A task was polled.
    Poll,
    /// A task completed.
    Complete,
    /// A timer was registered.
    TimerScheduled,
    /// A timer's deadline was reached and its waiter woken.
    TimerFired,
    /// Virtual time advanced.
    TimeAdvance,
}

/// One recorded scheduler event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Monotonic sequence number, assigned at record time.
    pub seq: u64,
    /// Virtual time at which the event occurred.
    pub at: Time,
    /// What happened.
    pub kind: TraceEventKind,
    /// The task involved, if the event concerns one.
    pub task: Option<TaskId>,
}

/// A ring buffer of recent [`TraceEvent`]s.
///
/// When the buffer is full, the oldest event is overwritten.
#[derive(Debug)]
pub struct TraceBuffer {
    events: Vec<Option<TraceEvent>>,
    head: usize,
    len: usize,
    next_seq: u64,
}

impl TraceBuffer {
    /// Creates a trace buffer with the given capacity (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            next_seq: 0,
        }
    }

    /// Returns the capacity of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Returns the number of retained events.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no events are retained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records an event, assigning it the next sequence number.
    pub fn record(&mut self, at: Time, kind: TraceEventKind, task: Option<TaskId>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let event = TraceEvent {
            seq,
            at,
            kind,
            task,
        };

        let idx = (self.head + self.len) % self.events.len();
        self.events[idx] = Some(event);
        if self.len < self.events.len() {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % self.events.len();
        }
    }

    /// Iterates over retained events, oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        (0..self.len).filter_map(move |i| {
            let idx = (self.head + i) % self.events.len();
            self.events[idx].as_ref()
        })
    }

    /// Returns the most recent event.
    #[must_use]
    pub fn last(&self) -> Option<&TraceEvent> {
        if self.len == 0 {
            None
        } else {
            let idx = (self.head + self.len - 1) % self.events.len();
            self.events[idx].as_ref()
        }
    }

    /// Clears all retained events; the sequence counter keeps counting.
    pub fn clear(&mut self) {
        for event in &mut self.events {
            *event = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Renders the retained events as a JSON array, for test artifacts.
    #[must_use]
    pub fn to_json(&self) -> String {
        let events: Vec<&TraceEvent> = self.iter().collect();
        serde_json::to_string_pretty(&events).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(1024)
    }
}
