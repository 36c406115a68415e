//! # circuitvisor
//!
//! **circuitvisor** evaluates boolean circuits concurrently on a tokio runtime.
//!
//! Every node of a submitted circuit runs as its own task. Gates consume their
//! children's values in arrival order and settle as soon as the result is determined,
//! cancelling the children that are no longer needed.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Circuit    │   │   Circuit    │   │   Circuit    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ submit()         ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  CircuitSolver (runtime orchestrator)                             │
//! │  - Registry (pending result cells + accepting flag)               │
//! │  - TaskTracker (every node task)                                  │
//! │  - runtime CancellationToken (parent of every node token)         │
//! │  - Bus → SubscriberSet (fans out to user subscribers)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   root NodeTask      root NodeTask      root NodeTask ──► CircuitValue
//!     ├─ NodeTask(.0)      ...                ...
//!     │    └─ ...
//!     └─ NodeTask(.1)
//! ```
//!
//! ### Evaluation
//! ```text
//! gate NodeTask:
//!   spawn one child task per argument (child token + DropGuard each)
//!   loop {
//!       select! {
//!           token.cancelled()  → None (nothing delivered upward)
//!           rx.recv()          → record value; settled? → Some(value)
//!       }
//!   }
//!   on exit: guards drop → unfinished children are cancelled
//! ```
//!
//! ### Settle rules
//! | Gate           | Settles `true` when                   | Settles `false` when                 |
//! |----------------|---------------------------------------|--------------------------------------|
//! | `AND`          | all children true (or no children)    | first false child                    |
//! | `OR`           | first true child                      | all children false (or no children)  |
//! | `GT(k)`        | more than `k` true children           | `n - k` false children (`k >= n`: at once) |
//! | `LT(k)`        | `n - k + 1` false children (`k > n`: at once) | `k` true children (`k = 0`: at once) |
//! | `IF(c, t, e)`  | selected branch true, or `t == e == true` | selected branch false, or `t == e == false` |
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                       |
//! |-------------------|-------------------------------------------------------------------|------------------------------------------|
//! | **Circuits**      | Immutable gate trees, shareable between submissions.              | [`CircuitNode`], [`Circuit`]             |
//! | **Solving**       | Submit circuits, read values, shut down.                          | [`CircuitSolver`], [`CircuitValue`]      |
//! | **Subscriber API**| Hook into evaluation events (logging, metrics, custom).           | [`Subscribe`], [`Event`]                 |
//! | **Errors**        | Typed errors for handles, circuit building and the engine.        | [`SolveError`], [`CircuitError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                                      | [`SolverConfig`]                         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use circuitvisor::{CircuitNode, CircuitSolver, SolveError, SolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn circuitvisor::Subscribe>> = vec![Arc::new(circuitvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn circuitvisor::Subscribe>> = Vec::new();
//!
//!     let solver = CircuitSolver::builder(SolverConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // (true AND NOT false) OR false
//!     let circuit = CircuitNode::or([
//!         CircuitNode::and([CircuitNode::leaf(true), CircuitNode::not(CircuitNode::leaf(false))]),
//!         CircuitNode::leaf(false),
//!     ]);
//!     let value = solver.submit(circuit);
//!     assert_eq!(value.value().await, Ok(true));
//!
//!     solver.shutdown_and_wait().await?;
//!     let late = solver.submit(CircuitNode::leaf(true));
//!     assert_eq!(late.value().await, Err(SolveError::EngineStopped));
//!     Ok(())
//! }
//! ```
mod circuit;
mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use circuit::{Circuit, CircuitNode, LeafNode, NodeType};
pub use config::SolverConfig;
pub use core::{CircuitSolver, CircuitValue, SolverBuilder};
pub use error::{CircuitError, RuntimeError, SolveError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
