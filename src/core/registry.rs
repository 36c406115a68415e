//! # Handle registry - outstanding results and the accept flag.
//!
//! The registry remembers every [`ValueCell`] that may still need to be failed by a
//! shutdown, and whether the solver still accepts work.
//!
//! ## Rules
//! - `accepting` and the cell list live under **one** mutex: a submission either
//!   registers before the shutdown sweep drains the list, or observes `accepting == false`.
//! - `close()` flips `accepting` exactly once; later calls return `None`.
//! - Registration is an append. Settled cells are dropped in a batch once the list
//!   reaches `prune_at`, which then doubles relative to the survivors, so each
//!   `register` costs amortized O(1) and the list stays within `2 * live + PRUNE_FLOOR`.
//!   Settled cells are never touched by the sweep anyway.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::cell::ValueCell;

/// List length below which settled cells are never pruned.
const PRUNE_FLOOR: usize = 64;

struct RegistryState {
    accepting: bool,
    cells: Vec<Arc<ValueCell>>,
    prune_at: usize,
}

/// Outstanding result cells of one solver.
pub(crate) struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                accepting: true,
                cells: Vec::new(),
                prune_at: PRUNE_FLOOR,
            }),
        }
    }

    /// Registers `cell` if the solver is still accepting; returns `false` otherwise.
    pub(crate) fn register(&self, cell: &Arc<ValueCell>) -> bool {
        let mut state = self.lock();
        if !state.accepting {
            return false;
        }
        if state.cells.len() >= state.prune_at {
            state.cells.retain(|c| c.is_pending());
            state.prune_at = (state.cells.len() * 2).max(PRUNE_FLOOR);
        }
        state.cells.push(Arc::clone(cell));
        true
    }

    /// Stops accepting and hands out every registered cell for the shutdown sweep.
    ///
    /// Returns `None` if the registry was already closed.
    pub(crate) fn close(&self) -> Option<Vec<Arc<ValueCell>>> {
        let mut state = self.lock();
        if !state.accepting {
            return None;
        }
        state.accepting = false;
        Some(std::mem::take(&mut state.cells))
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.lock().accepting
    }

    /// Registered cells that have not settled yet.
    pub(crate) fn pending(&self) -> usize {
        self.lock().cells.iter().filter(|c| c.is_pending()).count()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolveError;

    #[test]
    fn test_close_drains_once() {
        let reg = Registry::new();
        let cell = ValueCell::pending(1);
        assert!(reg.register(&cell));
        assert_eq!(reg.pending(), 1);

        let drained = reg.close().unwrap();
        assert_eq!(drained.len(), 1);
        assert!(!reg.is_accepting());
        assert!(reg.close().is_none());
    }

    #[test]
    fn test_register_after_close_is_refused() {
        let reg = Registry::new();
        reg.close();
        assert!(!reg.register(&ValueCell::pending(1)));
        assert_eq!(reg.pending(), 0);
    }

    fn tracked(reg: &Registry) -> usize {
        reg.lock().cells.len()
    }

    #[test]
    fn test_settled_cells_are_pruned() {
        let reg = Registry::new();
        for id in 0..PRUNE_FLOOR as u64 {
            let done = ValueCell::pending(id);
            reg.register(&done);
            done.settle(Ok(true));
        }
        assert_eq!(reg.pending(), 0);

        let live = ValueCell::pending(1_000);
        reg.register(&live);
        assert_eq!(tracked(&reg), 1);

        let drained = reg.close().unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].circuit(), 1_000);
        assert!(drained[0].settle(Err(SolveError::Cancelled)));
    }

    #[test]
    fn test_settled_churn_stays_bounded() {
        let reg = Registry::new();
        for id in 0..100_000 {
            let cell = ValueCell::pending(id);
            assert!(reg.register(&cell));
            cell.settle(Ok(id % 2 == 0));
            assert!(tracked(&reg) <= PRUNE_FLOOR);
        }
        assert_eq!(reg.pending(), 0);
    }

    #[test]
    fn test_live_cells_bound_the_list() {
        let reg = Registry::new();
        let mut live = Vec::new();
        for id in 0..20_000u64 {
            let cell = ValueCell::pending(id);
            reg.register(&cell);
            // Every fourth circuit is still running.
            if id % 4 == 0 {
                live.push(cell);
            } else {
                cell.settle(Ok(true));
            }
            assert!(tracked(&reg) <= 2 * live.len() + PRUNE_FLOOR);
        }
        assert_eq!(reg.pending(), live.len());
        assert_eq!(reg.close().unwrap().iter().filter(|c| c.is_pending()).count(), live.len());
    }

    #[test]
    fn test_many_pending_registrations_are_kept() {
        let reg = Registry::new();
        let cells: Vec<_> = (0..50_000).map(ValueCell::pending).collect();
        for cell in &cells {
            assert!(reg.register(cell));
        }
        assert_eq!(tracked(&reg), cells.len());
        assert_eq!(reg.pending(), cells.len());
    }
}
