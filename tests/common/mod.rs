#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use circuitvisor::{CircuitNode, CircuitSolver, Event, EventKind, SolverConfig, Subscribe};
use tokio::sync::mpsc;

/// Delay long enough that a test only passes if the leaf is never awaited.
pub const NEVER: Duration = Duration::from_secs(60);

/// Upper bound for anything that should settle without waiting on a `NEVER` leaf.
pub const FAST: Duration = Duration::from_secs(5);

/// Forwards every event into a channel the test can inspect.
pub struct Recorder(mpsc::UnboundedSender<Event>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        let _ = self.0.send(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn queue_capacity(&self) -> usize {
        65_536
    }
}

pub fn recorded_solver(cfg: SolverConfig) -> (Arc<CircuitSolver>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let solver = CircuitSolver::builder(cfg)
        .with_subscribers(vec![Arc::new(Recorder(tx))])
        .build();
    (solver, rx)
}

/// Waits for the first event matching `pred`; panics after [`FAST`].
pub async fn expect_event(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    mut pred: impl FnMut(&Event) -> bool,
) -> Event {
    tokio::time::timeout(FAST, async {
        loop {
            match rx.recv().await {
                Some(ev) if pred(&ev) => return ev,
                Some(_) => continue,
                None => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("expected event in time")
}

pub fn slow(value: bool) -> CircuitNode {
    CircuitNode::slow_leaf(value, NEVER)
}

/// Deterministic pseudo-random circuit generator (xorshift).
pub struct CircuitGen(u64);

impl CircuitGen {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u64) -> usize {
        (self.next() % n) as usize
    }

    pub fn circuit(&mut self, depth: usize) -> CircuitNode {
        if depth == 0 || self.below(4) == 0 {
            let value = self.below(2) == 0;
            return match self.below(3) {
                0 => CircuitNode::slow_leaf(value, Duration::from_millis(self.below(5) as u64)),
                _ => CircuitNode::leaf(value),
            };
        }
        let width = self.below(5);
        match self.below(6) {
            0 => CircuitNode::not(self.circuit(depth - 1)),
            1 => CircuitNode::and(self.args(width, depth - 1)),
            2 => CircuitNode::or(self.args(width, depth - 1)),
            3 => CircuitNode::if_then_else(
                self.circuit(depth - 1),
                self.circuit(depth - 1),
                self.circuit(depth - 1),
            ),
            4 => {
                let k = self.below(width as u64 + 2);
                CircuitNode::gt(k, self.args(width, depth - 1))
            }
            _ => {
                let k = self.below(width as u64 + 2);
                CircuitNode::lt(k, self.args(width, depth - 1))
            }
        }
    }

    fn args(&mut self, width: usize, depth: usize) -> Vec<CircuitNode> {
        (0..width).map(|_| self.circuit(depth)).collect()
    }
}

pub fn is_kind(kind: EventKind) -> impl FnMut(&Event) -> bool {
    move |ev| ev.kind == kind
}
