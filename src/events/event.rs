//! # Runtime events emitted by the solver and its node tasks.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Circuit events**: a submitted circuit's lifecycle (submitted, solved, cancelled)
//! - **Node events**: short-circuit decisions and cancellations inside the task tree
//! - **Shutdown events**: solver shutdown progress
//! - **Subscriber events**: problems inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as the circuit id,
//! node path, computed value and reason.
//!
//! ## Node paths
//! The root of circuit `7` has path `"7"`; child `i` of node `p` has path `"p.i"`.
//! For an `IF` node the children are `.0` (condition), `.1` (then) and `.2` (else).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use circuitvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NodeShortCircuited)
//!     .with_circuit(3)
//!     .with_node("3.1")
//!     .with_value(false)
//!     .with_pending(2);
//!
//! assert_eq!(ev.kind, EventKind::NodeShortCircuited);
//! assert_eq!(ev.node.as_deref(), Some("3.1"));
//! assert_eq!(ev.pending, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `node`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `node`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Circuit events ===
    /// Circuit accepted; its root task is spawned right after.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    /// - `pending`: number of nodes in the circuit
    CircuitSubmitted,

    /// Circuit submitted after shutdown; its handle is already failed.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    SubmitRejected,

    /// Root value delivered to the handle.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    /// - `value`: root value
    CircuitSolved,

    /// Handle failed with `Cancelled` by the shutdown sweep.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    CircuitCancelled,

    /// Root evaluation ended without a value while the solver was running.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    /// - `reason`: failure message
    CircuitFailed,

    // === Node events ===
    /// Gate decided before every child delivered.
    ///
    /// Sets:
    /// - `circuit`, `node`: gate identity
    /// - `value`: decided value
    /// - `pending`: children still undelivered (cancelled on exit)
    NodeShortCircuited,

    /// `IF` gate learned its condition and cancelled the unselected branch, which had not reported yet.
    ///
    /// Sets:
    /// - `circuit`: circuit id
    /// - `node`: path of the cancelled branch
    BranchPruned,

    /// Node task observed cancellation at a wait point and exits without a value.
    ///
    /// Sets:
    /// - `circuit`, `node`: task identity
    NodeCancelled,

    // === Shutdown events ===
    /// Shutdown requested (explicit call or OS signal).
    ///
    /// Sets:
    /// - `pending`: handles still pending at the sweep
    ShutdownRequested,

    /// All node tasks exited within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some node tasks were still running.
    ///
    /// Sets:
    /// - `pending`: number of tasks still running
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Circuit id, if applicable.
    pub circuit: Option<u64>,
    /// Node path (or subscriber name for subscriber events).
    pub node: Option<Arc<str>>,
    /// Computed value, if applicable.
    pub value: Option<bool>,
    /// A count whose meaning depends on `kind` (undelivered children, pending handles, ...).
    pub pending: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            circuit: None,
            node: None,
            value: None,
            pending: None,
            reason: None,
        }
    }

    /// Attaches a circuit id.
    #[inline]
    pub fn with_circuit(mut self, id: u64) -> Self {
        self.circuit = Some(id);
        self
    }

    /// Attaches a node path.
    #[inline]
    pub fn with_node(mut self, node: impl Into<Arc<str>>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches a computed value.
    #[inline]
    pub fn with_value(mut self, value: bool) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches a count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_pending(mut self, n: usize) -> Self {
        self.pending = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_node(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_node(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub(crate) fn with_node_if_absent(mut self, node: Arc<str>) -> Self {
        if self.node.is_none() {
            self.node = Some(node);
        }
        self
    }

    /// True for [`EventKind::SubscriberOverflow`]; such events are never re-reported on overflow.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::CircuitSubmitted);
        let b = Event::new(EventKind::CircuitSolved);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_pending_saturates() {
        let ev = Event::new(EventKind::GraceExceeded).with_pending(usize::MAX);
        assert_eq!(ev.pending, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_overflow_fields() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.node.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
