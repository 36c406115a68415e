use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    config::SolverConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::solver::CircuitSolver;

/// Builder for constructing a [`CircuitSolver`] with optional features.
pub struct SolverBuilder {
    cfg: SolverConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl SolverBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SolverConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            runtime: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (submissions, short-circuits, cancellations)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs every node task on `runtime` instead of the runtime current at `build()`.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds and returns the solver.
    ///
    /// # Panics
    /// Panics if no runtime was given and `build()` is called outside of a tokio runtime.
    pub fn build(self) -> Arc<CircuitSolver> {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let subs = if self.subscribers.is_empty() {
            None
        } else {
            Some(SubscriberSet::new(self.subscribers, bus.clone(), &runtime))
        };

        Arc::new(CircuitSolver::new_internal(self.cfg, bus, runtime, subs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitNode;

    #[test]
    fn test_build_on_explicit_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let solver = SolverBuilder::new(SolverConfig::default())
            .with_runtime(rt.handle().clone())
            .build();
        let value = solver.submit(CircuitNode::and([CircuitNode::leaf(true), CircuitNode::leaf(true)]));

        assert_eq!(value.blocking_value(), Ok(true));
        solver.shutdown();
        assert!(!solver.is_accepting());
    }
}
