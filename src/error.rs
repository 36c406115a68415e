//! Error types used by the circuitvisor runtime and its callers.
//!
//! This module defines three error enums:
//!
//! - [`SolveError`]: why a [`CircuitValue`](crate::CircuitValue) could not yield a value.
//! - [`CircuitError`]: a supplied circuit violates the node contract.
//! - [`RuntimeError`]: errors raised by the engine itself (shutdown exceeding its grace).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors observed when reading a circuit value.
///
/// A settled handle keeps returning the same error on every read.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The circuit was submitted after the solver stopped accepting work.
    #[error("solver stopped before the circuit was submitted")]
    EngineStopped,

    /// The solver was shut down before the circuit produced a value.
    #[error("computation cancelled by solver shutdown")]
    Cancelled,

    /// The root evaluation ended without a value while the solver was still running.
    #[error("internal error: {reason}")]
    Internal {
        /// What went wrong.
        reason: Arc<str>,
    },
}

impl SolveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use circuitvisor::SolveError;
    ///
    /// assert_eq!(SolveError::Cancelled.as_label(), "solve_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SolveError::EngineStopped => "solve_engine_stopped",
            SolveError::Cancelled => "solve_cancelled",
            SolveError::Internal { .. } => "solve_internal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SolveError::EngineStopped => "submitted after shutdown".to_string(),
            SolveError::Cancelled => "cancelled by shutdown".to_string(),
            SolveError::Internal { reason } => format!("internal: {reason}"),
        }
    }

    /// True for errors caused by solver shutdown (as opposed to a broken evaluation).
    pub fn is_shutdown(&self) -> bool {
        matches!(self, SolveError::EngineStopped | SolveError::Cancelled)
    }
}

/// # Errors produced while assembling a circuit from raw parts.
///
/// The engine itself never sees an invalid node: [`CircuitNode`](crate::CircuitNode)
/// makes wrong arities unrepresentable, so the contract is checked here, at the boundary.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// The node's children or payload do not fit its kind.
    #[error("invalid {kind} node: {reason}")]
    InvalidNode {
        /// Node kind label (`"LEAF"`, `"IF"`, ...).
        kind: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl CircuitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CircuitError::InvalidNode { .. } => "circuit_invalid_node",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CircuitError::InvalidNode { kind, reason } => format!("{kind}: {reason}"),
        }
    }
}

/// # Errors produced by the circuitvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some node tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; {stuck} node tasks still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of node tasks that did not exit in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use circuitvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 3 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_error_labels_are_stable() {
        assert_eq!(SolveError::EngineStopped.as_label(), "solve_engine_stopped");
        assert_eq!(SolveError::Cancelled.as_label(), "solve_cancelled");
        let internal = SolveError::Internal {
            reason: "boom".into(),
        };
        assert_eq!(internal.as_label(), "solve_internal");
        assert_eq!(internal.as_message(), "internal: boom");
    }

    #[test]
    fn test_shutdown_classification() {
        assert!(SolveError::EngineStopped.is_shutdown());
        assert!(SolveError::Cancelled.is_shutdown());
        assert!(
            !SolveError::Internal {
                reason: "x".into()
            }
            .is_shutdown()
        );
    }

    #[test]
    fn test_circuit_error_display() {
        let err = CircuitError::InvalidNode {
            kind: "IF",
            reason: "expected 3 children, got 2".into(),
        };
        assert_eq!(err.to_string(), "invalid IF node: expected 3 children, got 2");
        assert_eq!(err.as_label(), "circuit_invalid_node");
    }
}
