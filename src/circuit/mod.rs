//! Circuit representation consumed by the solver.
//!
//! ## Contents
//! - [`CircuitNode`] immutable gate tree (leaf constants, NOT/AND/OR, IF, GT/LT thresholds)
//! - [`NodeType`], [`LeafNode`] node classification and leaf payload
//! - [`Circuit`] a rooted tree as submitted to [`CircuitSolver`](crate::CircuitSolver)

mod node;

pub use node::{CircuitNode, LeafNode, NodeType};

/// A circuit ready for submission.
#[derive(Debug, Clone)]
pub struct Circuit {
    root: CircuitNode,
}

impl Circuit {
    /// Wraps `root` as a circuit.
    pub fn new(root: CircuitNode) -> Self {
        Self { root }
    }

    /// Root node.
    pub fn root(&self) -> &CircuitNode {
        &self.root
    }

    /// Number of nodes, i.e. the number of tasks a full evaluation would spawn.
    pub fn size(&self) -> usize {
        self.root.size()
    }
}

impl From<CircuitNode> for Circuit {
    fn from(root: CircuitNode) -> Self {
        Self::new(root)
    }
}
