//! # NodeTask: evaluation of one circuit node.
//!
//! Every node of a submitted circuit is evaluated by exactly one `NodeTask`, running
//! as its own tokio task. A gate spawns one task per child, collects their values over
//! a private channel and reports its own value upward.
//!
//! ## Architecture
//! ```text
//!                     ┌────────────── parent NodeTask ──────────────┐
//!                     │  token ─► child_token() per child            │
//!                     │  DropGuard per child (cancel on exit)        │
//!                     │  rx ◄── mpsc (arrival order) ◄──┐            │
//!                     └─────────────────────────────────┼────────────┘
//!                                                       │ send(value) / send((role, value))
//!                ┌──────────────────┬───────────────────┤
//!                ▼                  ▼                   ▼
//!          NodeTask(.0)       NodeTask(.1)   ...  NodeTask(.n-1)
//! ```
//!
//! ## Rules
//! - Children report in **arrival order**; a fast child can settle a gate before
//!   slower siblings report.
//! - Cancellation is cooperative: a task checks its token only while it waits
//!   (on its channel or on a slow leaf's delay). Pure computation is never interrupted.
//! - Leaving a gate drops its `DropGuard`s, cancelling every child still running.
//!   Cancelling a task cancels its whole subtree (child tokens).
//! - Results are three-valued: `Some(v)` is a computed value, `None` means the
//!   subtree was cancelled and **nothing is delivered**. A cancelled subtree is
//!   never reported to a parent as `false`.
//! - Node paths (`"<circuit>"`, `"<parent>.<index>"`) only exist when the bus had
//!   receivers at submission; without them no task formats a path.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;

use crate::circuit::{CircuitNode, LeafNode};
use crate::core::gate::{CondState, FanInRule, Role, Tally};
use crate::events::{Bus, Event, EventKind};

/// Boxed evaluation future; boxing breaks the recursive type between a task and its children.
pub(crate) type BoxEvalFuture = BoxFuture<'static, Option<bool>>;

/// What every task of one circuit shares.
pub(crate) struct EvalContext {
    pub(crate) circuit: u64,
    pub(crate) bus: Bus,
    pub(crate) tracker: TaskTracker,
    pub(crate) runtime: Handle,
}

/// One node under evaluation.
pub(crate) struct NodeTask {
    node: CircuitNode,
    path: Option<Arc<str>>,
    token: CancellationToken,
    ctx: Arc<EvalContext>,
}

impl NodeTask {
    /// Root task of a circuit; its path is the circuit id.
    pub(crate) fn root(node: CircuitNode, token: CancellationToken, ctx: Arc<EvalContext>) -> Self {
        Self {
            node,
            path: ctx
                .bus
                .has_receivers()
                .then(|| ctx.circuit.to_string().into()),
            token,
            ctx,
        }
    }

    /// Evaluates the node; `None` if the task was cancelled before settling.
    pub(crate) fn run(self) -> BoxEvalFuture {
        Box::pin(async move {
            let out = self.evaluate().await;
            if out.is_none() {
                self.publish(Event::new(EventKind::NodeCancelled));
            }
            out
        })
    }

    async fn evaluate(&self) -> Option<bool> {
        match &self.node {
            CircuitNode::Leaf(leaf) => self.leaf(*leaf).await,
            CircuitNode::Not(arg) => self.negate(arg).await,
            CircuitNode::And(args) => self.fan_in(FanInRule::All, args).await,
            CircuitNode::Or(args) => self.fan_in(FanInRule::Any, args).await,
            CircuitNode::Gt { threshold, args } => {
                self.fan_in(FanInRule::Greater(*threshold), args).await
            }
            CircuitNode::Lt { threshold, args } => {
                self.fan_in(FanInRule::Less(*threshold), args).await
            }
            CircuitNode::If(branches) => self.choose(branches).await,
        }
    }

    async fn leaf(&self, leaf: LeafNode) -> Option<bool> {
        if leaf.delay().is_zero() {
            return Some(leaf.value());
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            _ = tokio::time::sleep(leaf.delay()) => Some(leaf.value()),
        }
    }

    async fn negate(&self, arg: &CircuitNode) -> Option<bool> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _child = self.spawn_child(0, arg, tx, std::convert::identity);
        self.next(&mut rx).await.map(|v| !v)
    }

    /// AND / OR / GT / LT: consume child values until the tally settles.
    async fn fan_in(&self, rule: FanInRule, args: &[CircuitNode]) -> Option<bool> {
        let mut tally = Tally::new(rule, args.len());
        if let Some(v) = tally.settled_upfront() {
            return Some(v);
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _children: Vec<DropGuard> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| self.spawn_child(i, arg, tx.clone(), std::convert::identity))
            .collect();
        drop(tx);

        loop {
            let value = self.next(&mut rx).await?;
            if let Some(out) = tally.record(value) {
                let undelivered = tally.undelivered();
                if undelivered > 0 {
                    self.publish(
                        Event::new(EventKind::NodeShortCircuited)
                            .with_value(out)
                            .with_pending(undelivered),
                    );
                }
                return Some(out);
            }
        }
    }

    /// IF: three-way race between condition, then and else.
    async fn choose(&self, branches: &[CircuitNode; 3]) -> Option<bool> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut children: [Option<DropGuard>; 3] = Role::ALL.map(|role| {
            let arg = &branches[role.index()];
            Some(self.spawn_child(role.index(), arg, tx.clone(), move |v| (role, v)))
        });
        drop(tx);

        let mut state = CondState::default();
        loop {
            let (role, value) = self.next(&mut rx).await?;
            state.record(role, value);

            if let Some(loser) = state.prunable() {
                if children[loser.index()].take().is_some() {
                    if let Some(path) = self.child_path(loser.index()) {
                        self.publish(Event::new(EventKind::BranchPruned).with_node(path));
                    }
                }
            }

            if let Some(out) = state.decide() {
                if state.unselected().is_none() {
                    // Branches agreed; the condition is still running.
                    self.publish(
                        Event::new(EventKind::NodeShortCircuited)
                            .with_value(out)
                            .with_pending(1),
                    );
                }
                return Some(out);
            }
        }
    }

    /// Waits for the next child report; `None` on cancellation or if every child
    /// went away without reporting.
    async fn next<T>(&self, rx: &mut mpsc::UnboundedReceiver<T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            msg = rx.recv() => msg,
        }
    }

    /// Spawns the task for child `index`, delivering `tag(value)` into `tx`.
    ///
    /// The returned guard cancels the child (and its subtree) when dropped.
    fn spawn_child<T, F>(
        &self,
        index: usize,
        node: &CircuitNode,
        tx: mpsc::UnboundedSender<T>,
        tag: F,
    ) -> DropGuard
    where
        T: Send + 'static,
        F: FnOnce(bool) -> T + Send + 'static,
    {
        let token = self.token.child_token();
        let child = NodeTask {
            node: node.clone(),
            path: self.child_path(index),
            token: token.clone(),
            ctx: Arc::clone(&self.ctx),
        };

        self.ctx.tracker.spawn_on(
            async move {
                if let Some(value) = child.run().await {
                    // Parent may have settled already; a late delivery is discarded.
                    let _ = tx.send(tag(value));
                }
            },
            &self.ctx.runtime,
        );
        token.drop_guard()
    }

    fn child_path(&self, index: usize) -> Option<Arc<str>> {
        self.path
            .as_ref()
            .map(|path| format!("{path}.{index}").into())
    }

    fn publish(&self, ev: Event) {
        if let Some(path) = &self.path {
            self.ctx.bus.publish(
                ev.with_circuit(self.ctx.circuit)
                    .with_node_if_absent(Arc::clone(path)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(bus: Bus) -> Arc<EvalContext> {
        Arc::new(EvalContext {
            circuit: 7,
            bus,
            tracker: TaskTracker::new(),
            runtime: Handle::current(),
        })
    }

    #[tokio::test]
    async fn test_paths_skipped_without_receivers() {
        let ctx = context(Bus::new(8));
        let task = NodeTask::root(CircuitNode::leaf(true), CancellationToken::new(), ctx);
        assert!(task.path.is_none());
        assert!(task.child_path(2).is_none());
        assert_eq!(task.run().await, Some(true));
    }

    #[tokio::test]
    async fn test_paths_follow_child_indices() {
        let bus = Bus::new(8);
        let _rx = bus.subscribe();
        let task = NodeTask::root(CircuitNode::leaf(true), CancellationToken::new(), context(bus));
        assert_eq!(task.path.as_deref(), Some("7"));
        assert_eq!(task.child_path(2).as_deref(), Some("7.2"));
    }

    #[tokio::test]
    async fn test_cancelled_gate_delivers_nothing() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ctx = context(bus);
        let token = CancellationToken::new();
        let node = CircuitNode::and([
            CircuitNode::slow_leaf(true, std::time::Duration::from_secs(60)),
            CircuitNode::slow_leaf(true, std::time::Duration::from_secs(60)),
        ]);
        let task = NodeTask::root(node, token.clone(), Arc::clone(&ctx));

        let run = tokio::spawn(task.run());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        token.cancel();
        assert_eq!(run.await.unwrap(), None);

        ctx.tracker.close();
        ctx.tracker.wait().await;
        let mut cancelled = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::NodeCancelled {
                cancelled.push(ev.node.unwrap().to_string());
            }
        }
        cancelled.sort();
        assert_eq!(cancelled, ["7", "7.0", "7.1"]);
    }
}
