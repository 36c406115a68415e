//! # Global solver configuration.
//!
//! Provides [`SolverConfig`] centralized settings for the circuit solver.
//!
//! ## Sentinel values
//! - `grace = 0s` → `shutdown_and_wait` does not wait for node tasks at all
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the circuit solver.
///
/// ## Field semantics
/// - `grace`: Maximum wait for node tasks to exit after shutdown (`0s` = no wait)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Maximum time [`shutdown_and_wait`](crate::CircuitSolver::shutdown_and_wait)
    /// waits for cancelled node tasks to exit.
    ///
    /// Cancellation is cooperative: a slow leaf stops at its next wait point,
    /// so this only needs to cover scheduling latency.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl SolverConfig {
    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SolverConfig {
    /// Default configuration:
    ///
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
        }
    }
}
