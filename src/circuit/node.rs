//! # Circuit nodes.
//!
//! [`CircuitNode`] is an immutable tree of gates. Children are held behind `Arc`,
//! so cloning a node (which the engine does once per spawned task) is a refcount bump.
//!
//! ## Shapes
//! ```text
//! LEAF(v)          no children, constant v (optionally delayed)
//! NOT(a)           exactly 1 child
//! AND(a..)/OR(a..) n ≥ 0 children
//! IF(c, t, e)      exactly 3 children: condition, then, else
//! GT(k, a..)       true iff more than k children are true
//! LT(k, a..)       true iff fewer than k children are true
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CircuitError;

/// Node classification, independent of the node's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Leaf,
    Not,
    And,
    Or,
    If,
    Gt,
    Lt,
}

impl NodeType {
    /// Upper-case label used in logs and errors.
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeType::Leaf => "LEAF",
            NodeType::Not => "NOT",
            NodeType::And => "AND",
            NodeType::Or => "OR",
            NodeType::If => "IF",
            NodeType::Gt => "GT",
            NodeType::Lt => "LT",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Constant leaf.
///
/// A non-zero `delay` makes the leaf wait before reporting its value. The wait is
/// cancellable, which makes slow leaves useful to observe short-circuiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafNode {
    value: bool,
    delay: Duration,
}

impl LeafNode {
    /// Leaf value.
    pub fn value(&self) -> bool {
        self.value
    }

    /// Time the leaf waits before reporting (`Duration::ZERO` = immediate).
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Immutable boolean circuit node.
#[derive(Debug, Clone)]
pub enum CircuitNode {
    Leaf(LeafNode),
    Not(Arc<CircuitNode>),
    And(Arc<[CircuitNode]>),
    Or(Arc<[CircuitNode]>),
    If(Arc<[CircuitNode; 3]>),
    Gt {
        threshold: usize,
        args: Arc<[CircuitNode]>,
    },
    Lt {
        threshold: usize,
        args: Arc<[CircuitNode]>,
    },
}

impl CircuitNode {
    /// Constant leaf reporting immediately.
    pub fn leaf(value: bool) -> Self {
        Self::slow_leaf(value, Duration::ZERO)
    }

    /// Constant leaf that waits `delay` before reporting.
    pub fn slow_leaf(value: bool, delay: Duration) -> Self {
        CircuitNode::Leaf(LeafNode { value, delay })
    }

    /// Negation of `arg`.
    pub fn not(arg: CircuitNode) -> Self {
        CircuitNode::Not(Arc::new(arg))
    }

    /// Conjunction; `true` for zero children.
    pub fn and(args: impl IntoIterator<Item = CircuitNode>) -> Self {
        CircuitNode::And(args.into_iter().collect())
    }

    /// Disjunction; `false` for zero children.
    pub fn or(args: impl IntoIterator<Item = CircuitNode>) -> Self {
        CircuitNode::Or(args.into_iter().collect())
    }

    /// `then` if `condition` holds, `otherwise` if not.
    pub fn if_then_else(condition: CircuitNode, then: CircuitNode, otherwise: CircuitNode) -> Self {
        CircuitNode::If(Arc::new([condition, then, otherwise]))
    }

    /// True iff more than `threshold` of `args` are true.
    pub fn gt(threshold: usize, args: impl IntoIterator<Item = CircuitNode>) -> Self {
        CircuitNode::Gt {
            threshold,
            args: args.into_iter().collect(),
        }
    }

    /// True iff fewer than `threshold` of `args` are true.
    pub fn lt(threshold: usize, args: impl IntoIterator<Item = CircuitNode>) -> Self {
        CircuitNode::Lt {
            threshold,
            args: args.into_iter().collect(),
        }
    }

    /// Builds a node from loosely-typed parts, checking the arity contract.
    ///
    /// - `value` is required for `LEAF` and rejected elsewhere;
    /// - `threshold` is required for `GT`/`LT` and rejected elsewhere;
    /// - `NOT` takes exactly 1 child, `IF` exactly 3, `LEAF` none.
    ///
    /// # Example
    /// ```
    /// use circuitvisor::{CircuitNode, NodeType};
    ///
    /// let ok = CircuitNode::from_parts(NodeType::Not, vec![CircuitNode::leaf(true)], None, None);
    /// assert!(ok.is_ok());
    ///
    /// let bad = CircuitNode::from_parts(NodeType::If, vec![CircuitNode::leaf(true)], None, None);
    /// assert!(bad.is_err());
    /// ```
    pub fn from_parts(
        kind: NodeType,
        args: Vec<CircuitNode>,
        value: Option<bool>,
        threshold: Option<usize>,
    ) -> Result<Self, CircuitError> {
        let invalid = |reason: String| CircuitError::InvalidNode {
            kind: kind.as_label(),
            reason,
        };

        if value.is_some() && kind != NodeType::Leaf {
            return Err(invalid("only LEAF nodes carry a value".into()));
        }
        if threshold.is_some() && !matches!(kind, NodeType::Gt | NodeType::Lt) {
            return Err(invalid("only GT/LT nodes carry a threshold".into()));
        }

        match kind {
            NodeType::Leaf => {
                if !args.is_empty() {
                    return Err(invalid(format!("expected no children, got {}", args.len())));
                }
                let value = value.ok_or_else(|| invalid("missing value".into()))?;
                Ok(Self::leaf(value))
            }
            NodeType::Not => {
                let [arg]: [CircuitNode; 1] = args
                    .try_into()
                    .map_err(|a: Vec<_>| invalid(format!("expected 1 child, got {}", a.len())))?;
                Ok(Self::not(arg))
            }
            NodeType::If => {
                let branches: [CircuitNode; 3] = args
                    .try_into()
                    .map_err(|a: Vec<_>| invalid(format!("expected 3 children, got {}", a.len())))?;
                Ok(CircuitNode::If(Arc::new(branches)))
            }
            NodeType::And => Ok(Self::and(args)),
            NodeType::Or => Ok(Self::or(args)),
            NodeType::Gt | NodeType::Lt => {
                let threshold = threshold.ok_or_else(|| invalid("missing threshold".into()))?;
                if kind == NodeType::Gt {
                    Ok(Self::gt(threshold, args))
                } else {
                    Ok(Self::lt(threshold, args))
                }
            }
        }
    }

    /// Node classification.
    pub fn node_type(&self) -> NodeType {
        match self {
            CircuitNode::Leaf(_) => NodeType::Leaf,
            CircuitNode::Not(_) => NodeType::Not,
            CircuitNode::And(_) => NodeType::And,
            CircuitNode::Or(_) => NodeType::Or,
            CircuitNode::If(_) => NodeType::If,
            CircuitNode::Gt { .. } => NodeType::Gt,
            CircuitNode::Lt { .. } => NodeType::Lt,
        }
    }

    /// Ordered children (`IF` yields condition, then, else).
    pub fn args(&self) -> &[CircuitNode] {
        match self {
            CircuitNode::Leaf(_) => &[],
            CircuitNode::Not(arg) => std::slice::from_ref(arg.as_ref()),
            CircuitNode::And(args) | CircuitNode::Or(args) => &args[..],
            CircuitNode::If(branches) => &branches[..],
            CircuitNode::Gt { args, .. } | CircuitNode::Lt { args, .. } => &args[..],
        }
    }

    /// Leaf constant; `None` for gates.
    pub fn value(&self) -> Option<bool> {
        match self {
            CircuitNode::Leaf(leaf) => Some(leaf.value),
            _ => None,
        }
    }

    /// Threshold of a `GT`/`LT` gate; `None` otherwise.
    pub fn threshold(&self) -> Option<usize> {
        match self {
            CircuitNode::Gt { threshold, .. } | CircuitNode::Lt { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.args().iter().map(CircuitNode::size).sum::<usize>()
    }

    /// Reference value computed sequentially, without short-circuiting or delays.
    ///
    /// Handy as an oracle when testing the concurrent engine.
    pub fn eval_sequential(&self) -> bool {
        match self {
            CircuitNode::Leaf(leaf) => leaf.value,
            CircuitNode::Not(arg) => !arg.eval_sequential(),
            CircuitNode::And(args) => args.iter().all(CircuitNode::eval_sequential),
            CircuitNode::Or(args) => args.iter().any(CircuitNode::eval_sequential),
            CircuitNode::If(branches) => {
                let [condition, then, otherwise] = &**branches;
                if condition.eval_sequential() {
                    then.eval_sequential()
                } else {
                    otherwise.eval_sequential()
                }
            }
            CircuitNode::Gt { threshold, args } => count_true(args) > *threshold,
            CircuitNode::Lt { threshold, args } => count_true(args) < *threshold,
        }
    }
}

fn count_true(args: &[CircuitNode]) -> usize {
    args.iter().filter(|a| a.eval_sequential()).count()
}
