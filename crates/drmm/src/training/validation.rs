use std::ops::{Deref, DerefMut};

use crate::training::error::TrainError;
use crate::training::learner::{Learner, Mode};
use crate::training::progress;
use crate::training::source::BatchSource;

/// Holds a learner in [`Mode::Inference`] and restores its previous mode on
/// drop, including when the holder returns early with an error.
pub struct InferenceGuard<'a, L: Learner> {
    learner: &'a mut L,
    previous: Mode,
}

impl<'a, L: Learner> InferenceGuard<'a, L> {
    pub fn new(learner: &'a mut L) -> Self {
        let previous = learner.mode();
        learner.set_mode(Mode::Inference);
        Self { learner, previous }
    }
}

impl<L: Learner> Deref for InferenceGuard<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        self.learner
    }
}

impl<L: Learner> DerefMut for InferenceGuard<'_, L> {
    fn deref_mut(&mut self) -> &mut L {
        self.learner
    }
}

impl<L: Learner> Drop for InferenceGuard<'_, L> {
    fn drop(&mut self) {
        self.learner.set_mode(self.previous);
    }
}

/// Mean per-sample validation loss over the next `valid_num` batches.
///
/// Each batch contributes `loss / batch_size`. The source cursor is shared
/// across calls, so successive validations see successive segments of the
/// validation set and wrap around only when it is exhausted.
pub fn validate<L, S>(
    learner: &mut L,
    batches: &mut S,
    valid_num: usize,
    batch_size: usize,
    show_progress: bool,
) -> Result<f64, TrainError>
where
    L: Learner,
    S: BatchSource<Batch = L::Batch>,
{
    if valid_num == 0 || batch_size == 0 {
        return Err(TrainError::InvalidConfig(
            "valid_num and batch_size must be > 0".to_string(),
        ));
    }

    let mut learner = InferenceGuard::new(learner);
    let pb = progress::bar(valid_num, "Valid", show_progress);
    let mut total = 0.0;
    for i in 0..valid_num {
        let batch = batches.next_batch()?;
        total += learner.evaluate(&batch)? / batch_size as f64;
        pb.set_message(format!("loss={:.4}", total / (i + 1) as f64));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mean = total / valid_num as f64;
    tracing::debug!(valid_num, mean, "Validation pass complete");
    Ok(mean)
}
