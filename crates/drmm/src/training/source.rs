use corpus::{BatchCycler, PairBatch, PairSample};

use crate::training::error::TrainError;

/// Unbounded stream of training or validation batches.
///
/// Implementations wrap around on exhaustion; `next_batch` never reports
/// end-of-data.
pub trait BatchSource {
    type Batch;

    fn next_batch(&mut self) -> Result<Self::Batch, TrainError>;

    /// Number of completed wrap-arounds so far.
    fn passes(&self) -> usize;
}

impl BatchSource for BatchCycler<PairSample> {
    type Batch = PairBatch;

    fn next_batch(&mut self) -> Result<PairBatch, TrainError> {
        Ok(PairBatch::collate(&BatchCycler::next_batch(self)))
    }

    fn passes(&self) -> usize {
        self.rebuilds()
    }
}
