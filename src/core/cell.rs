//! # One-shot result cell and the caller-facing [`CircuitValue`] handle.
//!
//! ```text
//!             settle(Ok(v))  (root task)
//!   Pending ─────────────────────────────► Ready(Ok(v))
//!      │
//!      └───────────────────────────────────► Ready(Err(Cancelled))
//!             settle(Err(..)) (shutdown sweep / cancelled root)
//! ```
//!
//! ## Rules
//! - The cell leaves `Pending` exactly once; the first writer wins, later writers are no-ops.
//! - The transition happens under the watch channel's lock, so a natural delivery and
//!   the shutdown sweep can never both succeed.
//! - Readers never consume the value: every read returns the same settled result.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::SolveError;

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Ready(Result<bool, SolveError>),
}

impl Slot {
    fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }
}

/// Single-assignment cell shared by the producer (root task, shutdown sweep) and readers.
#[derive(Debug)]
pub(crate) struct ValueCell {
    circuit: u64,
    tx: watch::Sender<Slot>,
}

impl ValueCell {
    pub(crate) fn pending(circuit: u64) -> Arc<Self> {
        let (tx, _rx) = watch::channel(Slot::Pending);
        Arc::new(Self { circuit, tx })
    }

    pub(crate) fn failed(circuit: u64, err: SolveError) -> Arc<Self> {
        let (tx, _rx) = watch::channel(Slot::Ready(Err(err)));
        Arc::new(Self { circuit, tx })
    }

    pub(crate) fn circuit(&self) -> u64 {
        self.circuit
    }

    /// Moves the cell out of `Pending`; returns `false` if it was already settled.
    pub(crate) fn settle(&self, result: Result<bool, SolveError>) -> bool {
        self.tx.send_if_modified(move |slot| match slot {
            Slot::Pending => {
                *slot = Slot::Ready(result);
                true
            }
            Slot::Ready(_) => false,
        })
    }

    pub(crate) fn is_pending(&self) -> bool {
        !self.tx.borrow().is_ready()
    }

    fn peek(&self) -> Option<Result<bool, SolveError>> {
        match &*self.tx.borrow() {
            Slot::Pending => None,
            Slot::Ready(res) => Some(res.clone()),
        }
    }

    async fn wait(&self) -> Result<bool, SolveError> {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(Slot::is_ready).await {
            Ok(slot) => match &*slot {
                Slot::Ready(res) => res.clone(),
                Slot::Pending => Err(SolveError::Cancelled),
            },
            // The sender lives as long as `self`; treat a closed channel as cancellation.
            Err(_) => Err(SolveError::Cancelled),
        }
    }
}

/// Handle to the eventual value of a submitted circuit.
///
/// Returned by [`CircuitSolver::submit`](crate::CircuitSolver::submit) without blocking.
/// Cloning the handle is cheap; all clones observe the same result.
///
/// ## Example
/// ```rust
/// use circuitvisor::{CircuitNode, CircuitSolver, SolverConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let solver = CircuitSolver::new(SolverConfig::default());
///     let value = solver.submit(CircuitNode::not(CircuitNode::leaf(false)));
///
///     assert_eq!(value.value().await, Ok(true));
///     // memoized
///     assert_eq!(value.value().await, Ok(true));
///     solver.shutdown();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CircuitValue {
    cell: Arc<ValueCell>,
}

impl CircuitValue {
    pub(crate) fn new(cell: Arc<ValueCell>) -> Self {
        Self { cell }
    }

    /// Id of the circuit, as used in [`Event::circuit`](crate::Event::circuit).
    pub fn circuit_id(&self) -> u64 {
        self.cell.circuit()
    }

    /// Waits for the circuit's value.
    ///
    /// ### Errors
    /// - [`SolveError::EngineStopped`]: submitted after shutdown
    /// - [`SolveError::Cancelled`]: solver shut down before the value was produced
    /// - [`SolveError::Internal`]: evaluation broke down without a shutdown
    ///
    /// Once settled, every call returns the same result immediately.
    pub async fn value(&self) -> Result<bool, SolveError> {
        self.cell.wait().await
    }

    /// Blocking variant of [`value`](Self::value) for synchronous callers.
    ///
    /// Parks the current thread; do not call it from inside an async context.
    pub fn blocking_value(&self) -> Result<bool, SolveError> {
        futures::executor::block_on(self.cell.wait())
    }

    /// Returns the result if it is already settled, without waiting.
    pub fn try_value(&self) -> Option<Result<bool, SolveError>> {
        self.cell.peek()
    }

    /// True once the handle is settled (value or error).
    pub fn is_ready(&self) -> bool {
        !self.cell.is_pending()
    }
}
