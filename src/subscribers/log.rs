//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [submitted] circuit=1 nodes=7
//! [short-circuit] circuit=1 node="1.0" value=false pending=2
//! [pruned] circuit=1 branch="1.2"
//! [cancelled-node] circuit=1 node="1.0.1"
//! [solved] circuit=1 value=false
//! [shutdown-requested] pending=0
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let node = e.node.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::CircuitSubmitted => {
                println!("[submitted] circuit={:?} nodes={:?}", e.circuit, e.pending);
            }
            EventKind::SubmitRejected => {
                println!("[rejected] circuit={:?}", e.circuit);
            }
            EventKind::CircuitSolved => {
                println!("[solved] circuit={:?} value={:?}", e.circuit, e.value);
            }
            EventKind::CircuitCancelled => {
                println!("[cancelled] circuit={:?}", e.circuit);
            }
            EventKind::CircuitFailed => {
                println!("[failed] circuit={:?} err={:?}", e.circuit, e.reason);
            }
            EventKind::NodeShortCircuited => {
                println!(
                    "[short-circuit] circuit={:?} node={node:?} value={:?} pending={:?}",
                    e.circuit, e.value, e.pending
                );
            }
            EventKind::BranchPruned => {
                println!("[pruned] circuit={:?} branch={node:?}", e.circuit);
            }
            EventKind::NodeCancelled => {
                println!("[cancelled-node] circuit={:?} node={node:?}", e.circuit);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested] pending={:?}", e.pending);
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded] running={:?}", e.pending);
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={node} reason={:?}",
                    e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={node} info={}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
