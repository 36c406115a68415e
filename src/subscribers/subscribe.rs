//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers into the solver.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently of node tasks)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue; it never slows evaluation down.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use circuitvisor::{Event, EventKind, Subscribe};
//!
//! struct Pruning;
//!
//! #[async_trait]
//! impl Subscribe for Pruning {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::NodeShortCircuited) {
//!             // count saved work, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "pruning" }
//!     fn queue_capacity(&self) -> usize { 4096 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for solver observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor (node tasks share it).
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// Node events can be bursty on wide circuits; size accordingly.
    /// The runtime clamps capacity to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
