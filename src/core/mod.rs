//! Runtime core: evaluation and lifecycle.
//!
//! The public API from this module is [`CircuitSolver`] (with its [`SolverBuilder`])
//! and the [`CircuitValue`] handle it returns.
//!
//! Internal modules:
//! - [`solver`]: accepts circuits, spawns root tasks, handles shutdown;
//! - [`node`]: evaluates one node as a task and spawns its children;
//! - [`gate`]: pure settle rules for AND/OR/GT/LT and IF;
//! - [`cell`]: one-shot result cell behind [`CircuitValue`];
//! - [`registry`]: pending cells and the accepting flag;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod cell;
mod gate;
mod node;
mod registry;
mod shutdown;
mod solver;

pub use builder::SolverBuilder;
pub use cell::CircuitValue;
pub use solver::CircuitSolver;
