//! # CircuitSolver: accepts circuits, runs their task trees, and shuts them down.
//!
//! The [`CircuitSolver`] owns the event bus, the handle registry, a task tracker for
//! every node task, and the runtime cancellation token all root tasks derive from.
//!
//! ## Key responsibilities
//! - spawn one root `NodeTask` per submitted circuit and hand back a [`CircuitValue`]
//! - forward bus events to the [`SubscriberSet`] (fire-and-forget)
//! - on shutdown: stop accepting, cancel every task, fail every pending handle
//!
//! ## High-level architecture
//! ```text
//! submit(circuit):
//!   registry.register(cell) ──► rejected? ─► CircuitValue(Err(EngineStopped))
//!        │
//!        └─► root token = runtime_token.child_token()
//!            tracker.spawn_on(root NodeTask) ─► settle(cell, value)
//!
//! shutdown():
//!   registry.close()         → accepting = false, take pending cells (once)
//!   Bus.publish(ShutdownRequested)
//!   tracker.close()
//!   runtime_token.cancel()   → propagates to every node token
//!   cell.settle(Err(Cancelled)) for each cell still pending
//!
//! shutdown_and_wait():
//!   shutdown() then wait for tracker within cfg.grace
//!      ├─ Ok (all exited)   → Bus.publish(AllStoppedWithin)
//!      └─ timeout exceeded  → Bus.publish(GraceExceeded) → RuntimeError::GraceExceeded
//! ```
//!
//! ## Example
//! ```rust
//! use circuitvisor::{CircuitNode, CircuitSolver, SolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let solver = CircuitSolver::new(SolverConfig::default());
//!
//!     let circuit = CircuitNode::if_then_else(
//!         CircuitNode::leaf(true),
//!         CircuitNode::gt(1, [CircuitNode::leaf(true), CircuitNode::leaf(true), CircuitNode::leaf(false)]),
//!         CircuitNode::leaf(false),
//!     );
//!     let value = solver.submit(circuit);
//!     assert!(value.value().await?);
//!
//!     solver.shutdown_and_wait().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::circuit::{Circuit, CircuitNode};
use crate::config::SolverConfig;
use crate::core::{
    builder::SolverBuilder,
    cell::{CircuitValue, ValueCell},
    node::{EvalContext, NodeTask},
    registry::Registry,
    shutdown,
};
use crate::error::{RuntimeError, SolveError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;

/// Concurrent evaluator of boolean circuits.
///
/// Dropping the solver shuts it down (see [`shutdown`](Self::shutdown)).
pub struct CircuitSolver {
    cfg: SolverConfig,
    bus: Bus,
    registry: Registry,
    tracker: TaskTracker,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    runtime: Handle,
    next_id: AtomicU64,
}

impl CircuitSolver {
    /// Creates a solver without subscribers on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime; use
    /// [`SolverBuilder::with_runtime`] to run elsewhere.
    pub fn new(cfg: SolverConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    /// Returns a builder for a solver with subscribers or an explicit runtime.
    pub fn builder(cfg: SolverConfig) -> SolverBuilder {
        SolverBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SolverConfig,
        bus: Bus,
        runtime: Handle,
        subscribers: Option<SubscriberSet>,
    ) -> Self {
        let solver = Self {
            cfg,
            bus,
            registry: Registry::new(),
            tracker: TaskTracker::new(),
            runtime_token: CancellationToken::new(),
            listener_token: CancellationToken::new(),
            runtime,
            next_id: AtomicU64::new(1),
        };
        if let Some(set) = subscribers {
            solver.subscriber_listener(set);
        }
        solver
    }

    /// Submits a circuit for evaluation and returns immediately.
    ///
    /// After [`shutdown`](Self::shutdown) the returned handle is already failed
    /// with [`SolveError::EngineStopped`] and nothing is spawned.
    pub fn submit(&self, circuit: impl Into<Circuit>) -> CircuitValue {
        let circuit = circuit.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cell = ValueCell::pending(id);

        if !self.registry.register(&cell) {
            self.bus
                .publish(Event::new(EventKind::SubmitRejected).with_circuit(id));
            return CircuitValue::new(ValueCell::failed(id, SolveError::EngineStopped));
        }

        if self.bus.has_receivers() {
            self.bus.publish(
                Event::new(EventKind::CircuitSubmitted)
                    .with_circuit(id)
                    .with_pending(circuit.size()),
            );
        }
        self.spawn_root(id, circuit.root().clone(), Arc::clone(&cell));
        CircuitValue::new(cell)
    }

    /// Stops accepting circuits, cancels every running task and fails every
    /// pending handle with [`SolveError::Cancelled`].
    ///
    /// Idempotent. Handles that already hold a value keep it.
    pub fn shutdown(&self) {
        let Some(cells) = self.registry.close() else {
            return;
        };

        self.bus.publish(
            Event::new(EventKind::ShutdownRequested)
                .with_pending(cells.iter().filter(|c| c.is_pending()).count()),
        );
        self.tracker.close();
        self.runtime_token.cancel();

        for cell in cells {
            if cell.settle(Err(SolveError::Cancelled)) {
                self.bus.publish(
                    Event::new(EventKind::CircuitCancelled).with_circuit(cell.circuit()),
                );
            }
        }
    }

    /// [`shutdown`](Self::shutdown), then waits up to [`SolverConfig::grace`] for every
    /// node task to exit.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] if some tasks are still running after the
    /// grace period. With `grace = 0` it returns right after the shutdown sweep.
    pub async fn shutdown_and_wait(&self) -> Result<(), RuntimeError> {
        self.shutdown();
        let Some(grace) = self.cfg.grace_period() else {
            return Ok(());
        };

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.tracker.len();
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_pending(stuck));
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Calls [`shutdown`](Self::shutdown) when the process receives a termination signal.
    ///
    /// The listener holds only a weak reference and ends with the solver.
    pub fn shutdown_on_signal(self: &Arc<Self>) {
        let solver = Arc::downgrade(self);
        let token = self.runtime_token.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                res = shutdown::wait_for_shutdown_signal() => {
                    if res.is_ok() {
                        if let Some(solver) = solver.upgrade() {
                            solver.shutdown();
                        }
                    }
                }
            }
        });
    }

    /// False once [`shutdown`](Self::shutdown) has been called.
    pub fn is_accepting(&self) -> bool {
        self.registry.is_accepting()
    }

    /// Number of submitted circuits whose value is not settled yet.
    pub fn pending(&self) -> usize {
        self.registry.pending()
    }

    /// Number of node tasks currently alive (all circuits).
    pub fn running_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Returns the solver's configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.cfg
    }

    /// Spawns the root task of circuit `id`; the task settles `cell` when it ends.
    fn spawn_root(&self, id: u64, root: CircuitNode, cell: Arc<ValueCell>) {
        let ctx = Arc::new(EvalContext {
            circuit: id,
            bus: self.bus.clone(),
            tracker: self.tracker.clone(),
            runtime: self.runtime.clone(),
        });
        let token = self.runtime_token.child_token();
        let task = NodeTask::root(root, token.clone(), ctx);
        let bus = self.bus.clone();

        self.tracker.spawn_on(
            async move {
                let outcome = match task.run().await {
                    Some(value) => Ok(value),
                    None if token.is_cancelled() => Err(SolveError::Cancelled),
                    None => Err(SolveError::Internal {
                        reason: "root evaluation ended without a value".into(),
                    }),
                };
                let ev = match &outcome {
                    Ok(value) => Event::new(EventKind::CircuitSolved).with_value(*value),
                    Err(SolveError::Cancelled) => Event::new(EventKind::CircuitCancelled),
                    Err(err) => Event::new(EventKind::CircuitFailed).with_reason(err.to_string()),
                };
                if cell.settle(outcome) {
                    bus.publish(ev.with_circuit(id));
                }
            },
            &self.runtime,
        );
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self, set: SubscriberSet) {
        let mut rx = self.bus.subscribe();
        let stop = self.listener_token.clone();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            set.shutdown().await;
        });
    }
}

impl Drop for CircuitSolver {
    fn drop(&mut self) {
        self.shutdown();
        self.listener_token.cancel();
    }
}
