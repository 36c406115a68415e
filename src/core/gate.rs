//! # Gate decisions.
//!
//! Pure bookkeeping for gates that fan in over their children. The node task feeds
//! child values in **arrival order**; these types say when the outcome is settled.
//!
//! ## Fan-in rules (n children, k threshold)
//! ```text
//! rule      settled before spawning      settled after a delivery
//! AND       n == 0 → true                 any false → false;  all true → true
//! OR        n == 0 → false                any true  → true;   all false → false
//! GT(k)     k ≥ n → false                 trues > k → true;   falses ≥ n-k → false
//! LT(k)     k == 0 → false, k > n → true  trues ≥ k → false;  falses > n-k → true
//! ```
//! Each "after a delivery" row fires at the earliest point where the undelivered
//! children can no longer change the outcome.
//!
//! ## IF
//! [`CondState`] records which of condition/then/else are known. It decides:
//! - condition known → the selected branch, once that branch is known;
//! - condition unknown → the common branch value, once both branches are known and agree.

/// How a fan-in gate combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FanInRule {
    All,
    Any,
    Greater(usize),
    Less(usize),
}

/// Running true/false counts for one fan-in gate.
#[derive(Debug)]
pub(crate) struct Tally {
    rule: FanInRule,
    total: usize,
    trues: usize,
    falses: usize,
}

impl Tally {
    pub(crate) fn new(rule: FanInRule, total: usize) -> Self {
        Self {
            rule,
            total,
            trues: 0,
            falses: 0,
        }
    }

    /// Outcome known without evaluating any child.
    pub(crate) fn settled_upfront(&self) -> Option<bool> {
        match self.rule {
            FanInRule::All if self.total == 0 => Some(true),
            FanInRule::Any if self.total == 0 => Some(false),
            FanInRule::Greater(k) if k >= self.total => Some(false),
            FanInRule::Less(0) => Some(false),
            FanInRule::Less(k) if k > self.total => Some(true),
            _ => None,
        }
    }

    /// Records one child value; returns the outcome once it is settled.
    pub(crate) fn record(&mut self, value: bool) -> Option<bool> {
        if value {
            self.trues += 1;
        } else {
            self.falses += 1;
        }

        let n = self.total;
        match self.rule {
            FanInRule::All if !value => Some(false),
            FanInRule::All if self.trues == n => Some(true),
            FanInRule::Any if value => Some(true),
            FanInRule::Any if self.falses == n => Some(false),
            FanInRule::Greater(k) if self.trues > k => Some(true),
            FanInRule::Greater(k) if self.falses >= n.saturating_sub(k) => Some(false),
            FanInRule::Less(k) if self.trues >= k => Some(false),
            FanInRule::Less(k) if self.falses > n.saturating_sub(k) => Some(true),
            _ => None,
        }
    }

    /// Children that have not delivered yet.
    pub(crate) fn undelivered(&self) -> usize {
        self.total - self.trues - self.falses
    }
}

/// Position of a child under an `IF` gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Condition,
    Then,
    Else,
}

impl Role {
    pub(crate) const ALL: [Role; 3] = [Role::Condition, Role::Then, Role::Else];

    pub(crate) fn index(self) -> usize {
        match self {
            Role::Condition => 0,
            Role::Then => 1,
            Role::Else => 2,
        }
    }
}

/// What an `IF` gate knows so far.
#[derive(Debug, Default)]
pub(crate) struct CondState {
    condition: Option<bool>,
    then: Option<bool>,
    otherwise: Option<bool>,
}

impl CondState {
    pub(crate) fn record(&mut self, role: Role, value: bool) {
        let slot = match role {
            Role::Condition => &mut self.condition,
            Role::Then => &mut self.then,
            Role::Else => &mut self.otherwise,
        };
        *slot = Some(value);
    }

    fn get(&self, role: Role) -> Option<bool> {
        match role {
            Role::Condition => self.condition,
            Role::Then => self.then,
            Role::Else => self.otherwise,
        }
    }

    /// Branch made irrelevant by the condition, if the condition is known.
    pub(crate) fn unselected(&self) -> Option<Role> {
        self.condition
            .map(|c| if c { Role::Else } else { Role::Then })
    }

    /// Unselected branch that is still running; `None` once it has reported.
    pub(crate) fn prunable(&self) -> Option<Role> {
        self.unselected().filter(|role| self.get(*role).is_none())
    }

    /// Re-examines everything received so far.
    pub(crate) fn decide(&self) -> Option<bool> {
        match (self.condition, self.then, self.otherwise) {
            (Some(true), then, _) => then,
            (Some(false), _, otherwise) => otherwise,
            (None, Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }
}
