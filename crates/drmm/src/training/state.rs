//! Best-checkpoint bookkeeping.
//!
//! Two losses gate persistence. `min_loss` is the best validation loss seen
//! so far and always has a matching candidate snapshot; `prev_loss` is the
//! loss of the last snapshot actually persisted. A save point writes only
//! when the candidate beats what is already on disk.

/// Mutable state of one training run.
#[derive(Debug, Clone)]
pub struct TrainingState<S> {
    /// Completed optimizer steps.
    pub step: usize,
    /// Best validation loss observed.
    pub min_loss: f64,
    /// Validation loss of the last persisted snapshot. Never increases.
    pub prev_loss: f64,
    /// Snapshot taken when `min_loss` was last improved.
    pub best_snapshot: Option<S>,
    /// Number of snapshots persisted.
    pub saves: usize,
}

impl<S> Default for TrainingState<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TrainingState<S> {
    pub fn new() -> Self {
        Self {
            step: 0,
            min_loss: f64::INFINITY,
            prev_loss: f64::INFINITY,
            best_snapshot: None,
            saves: 0,
        }
    }

    /// Record a validation result. On strict improvement, takes a snapshot
    /// via `snapshot` and returns true.
    pub fn observe_validation(&mut self, loss: f64, snapshot: impl FnOnce() -> S) -> bool {
        if loss < self.min_loss {
            self.min_loss = loss;
            self.best_snapshot = Some(snapshot());
            true
        } else {
            false
        }
    }

    /// The candidate to write at a save point, if it beats the persisted one.
    pub fn pending_checkpoint(&self) -> Option<(&S, f64)> {
        if self.min_loss < self.prev_loss {
            self.best_snapshot.as_ref().map(|s| (s, self.min_loss))
        } else {
            None
        }
    }

    /// Mark the current candidate as written.
    pub fn mark_persisted(&mut self) {
        self.prev_loss = self.min_loss;
        self.saves += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_has_nothing_to_save() {
        let state = TrainingState::<u32>::new();
        assert_eq!(state.min_loss, f64::INFINITY);
        assert_eq!(state.prev_loss, f64::INFINITY);
        assert!(state.pending_checkpoint().is_none());
    }

    #[test]
    fn test_improvement_takes_snapshot() {
        let mut state = TrainingState::new();
        assert!(state.observe_validation(0.8, || "a"));
        assert!(!state.observe_validation(0.8, || "b"), "ties do not improve");
        assert!(!state.observe_validation(0.9, || "c"));
        assert_eq!(state.best_snapshot, Some("a"));
        assert_eq!(state.pending_checkpoint(), Some((&"a", 0.8)));
    }

    #[test]
    fn test_snapshot_closure_runs_only_on_improvement() {
        let mut state = TrainingState::new();
        let mut taken = 0;
        state.observe_validation(0.5, || {
            taken += 1;
        });
        state.observe_validation(0.7, || {
            taken += 1;
        });
        assert_eq!(taken, 1);
    }

    #[test]
    fn test_persist_then_no_repeat_until_better() {
        let mut state = TrainingState::new();
        state.observe_validation(0.5, || 1);
        state.mark_persisted();
        assert_eq!(state.prev_loss, 0.5);
        assert!(state.pending_checkpoint().is_none());

        state.observe_validation(0.5, || 2);
        assert!(state.pending_checkpoint().is_none());

        state.observe_validation(0.3, || 3);
        assert_eq!(state.pending_checkpoint(), Some((&3, 0.3)));
        state.mark_persisted();
        assert_eq!(state.saves, 2);
    }
}
