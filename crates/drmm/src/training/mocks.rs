//! Mock implementations of the training seams for testing the loop without
//! a model or files.

use std::collections::VecDeque;

use crate::training::checkpoint::CheckpointSink;
use crate::training::error::TrainError;
use crate::training::learner::{Learner, Mode};
use crate::training::source::BatchSource;

// ---------------------------------------------------------------------------
// MockLearner
// ---------------------------------------------------------------------------

/// Learner whose validation losses are scripted.
///
/// Batches are plain indices. Snapshots are the number of optimizer steps
/// taken when the snapshot was requested, so tests can tell which point of
/// the run a persisted snapshot came from.
pub struct MockLearner {
    eval_losses: VecDeque<f64>,
    train_loss: f64,
    mode: Mode,
    fail_evaluate_after: Option<usize>,
    /// Optimizer steps taken.
    pub steps: usize,
    /// Batch indices passed to `evaluate`, in order.
    pub evaluated: Vec<usize>,
    /// Batch indices passed to `step`, in order.
    pub trained: Vec<usize>,
}

impl MockLearner {
    /// Create a learner returning `eval_losses` from successive `evaluate`
    /// calls, then 1.0 once the script runs out.
    pub fn new(eval_losses: Vec<f64>) -> Self {
        Self {
            eval_losses: eval_losses.into(),
            train_loss: 1.0,
            mode: Mode::Training,
            fail_evaluate_after: None,
            steps: 0,
            evaluated: Vec::new(),
            trained: Vec::new(),
        }
    }

    /// Loss returned by every `step`.
    pub fn with_train_loss(mut self, loss: f64) -> Self {
        self.train_loss = loss;
        self
    }

    /// Fail every `evaluate` call after the first `n` succeed.
    pub fn fail_evaluate_after(mut self, n: usize) -> Self {
        self.fail_evaluate_after = Some(n);
        self
    }

    fn require(&self, operation: &'static str, mode: Mode) -> Result<(), TrainError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(TrainError::WrongMode {
                operation,
                mode: self.mode,
            })
        }
    }
}

impl Learner for MockLearner {
    type Batch = usize;
    type Snapshot = usize;

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn step(&mut self, batch: &usize) -> Result<f64, TrainError> {
        self.require("step", Mode::Training)?;
        self.steps += 1;
        self.trained.push(*batch);
        Ok(self.train_loss)
    }

    fn evaluate(&mut self, batch: &usize) -> Result<f64, TrainError> {
        self.require("evaluate", Mode::Inference)?;
        if self.fail_evaluate_after.is_some_and(|n| self.evaluated.len() >= n) {
            return Err(TrainError::Collaborator(anyhow::anyhow!(
                "injected evaluate failure on batch {batch}"
            )));
        }
        self.evaluated.push(*batch);
        Ok(self.eval_losses.pop_front().unwrap_or(1.0))
    }

    fn snapshot(&self) -> usize {
        self.steps
    }
}

// ---------------------------------------------------------------------------
// CountingSource
// ---------------------------------------------------------------------------

/// Sequential source over indices `0..len` that wraps around.
pub struct CountingSource {
    len: usize,
    cursor: usize,
    passes: usize,
}

impl CountingSource {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cursor: 0,
            passes: 0,
        }
    }
}

impl BatchSource for CountingSource {
    type Batch = usize;

    fn next_batch(&mut self) -> Result<usize, TrainError> {
        if self.cursor >= self.len {
            self.cursor = 0;
            self.passes += 1;
        }
        let batch = self.cursor;
        self.cursor += 1;
        Ok(batch)
    }

    fn passes(&self) -> usize {
        self.passes
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Checkpoint sink that records what it was asked to persist.
pub struct MockSink<S> {
    /// `(snapshot, loss)` in persist order.
    pub saved: Vec<(S, f64)>,
    fail: bool,
}

impl<S> Default for MockSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MockSink<S> {
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            fail: false,
        }
    }

    /// A sink whose every write fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            saved: Vec::new(),
            fail: true,
        }
    }
}

impl<S: Clone> CheckpointSink<S> for MockSink<S> {
    fn persist(&mut self, snapshot: &S, loss: f64) -> Result<(), TrainError> {
        if self.fail {
            return Err(TrainError::CheckpointIo {
                path: "mock.ckpt".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.saved.push((snapshot.clone(), loss));
        Ok(())
    }
}
