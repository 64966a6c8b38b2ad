//! DRMM training loop.
//!
//! Pulls batches from an unbounded training stream, takes one optimizer step
//! per batch, validates every `valid_steps` steps, and at every `save_steps`
//! boundary persists the best snapshot if it beats the last one written.

use std::time::Instant;

use anyhow::Context;
use burn::prelude::*;

use crate::training::checkpoint::CheckpointSink;
use crate::training::error::TrainError;
use crate::training::learner::Learner;
use crate::training::progress;
use crate::training::source::BatchSource;
use crate::training::state::TrainingState;
use crate::training::validation::validate;

/// Configuration for DRMM training.
#[derive(Config, Debug)]
pub struct DrmmTrainingConfig {
    /// Learning rate for AdamW.
    #[config(default = 1e-3)]
    pub lr: f64,
    /// Steps between validation passes.
    #[config(default = 5000)]
    pub valid_steps: usize,
    /// Steps between checkpoint save points.
    #[config(default = 5000)]
    pub save_steps: usize,
    /// Validation batches per pass.
    #[config(default = 250)]
    pub valid_num: usize,
    /// Pairs per batch. Also the divisor for per-sample losses.
    #[config(default = 8)]
    pub batch_size: usize,
    /// Stop after this many steps. `None` trains until the process is stopped.
    pub max_steps: Option<usize>,
    /// Seed for shuffling and pair sampling.
    #[config(default = 42)]
    pub seed: u64,
    /// Draw live progress bars.
    #[config(default = true)]
    pub show_progress: bool,
}

impl DrmmTrainingConfig {
    /// Reject settings that would divide by zero or never validate.
    pub fn validate(&self) -> Result<(), TrainError> {
        for (name, value) in [
            ("valid_steps", self.valid_steps),
            ("save_steps", self.save_steps),
            ("valid_num", self.valid_num),
            ("batch_size", self.batch_size),
        ] {
            if value == 0 {
                return Err(TrainError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return Err(TrainError::InvalidConfig(format!(
                "lr must be a positive number, got {}",
                self.lr
            )));
        }
        Ok(())
    }
}

/// Run the training loop.
///
/// Both batch sources are consumed through persistent cursors: the training
/// stream advances one batch per step, the validation stream `valid_num`
/// batches per validation. Any error from a collaborator ends the run.
///
/// # Returns
/// The final [`TrainingState`]. Only reached when `config.max_steps` is set.
pub fn train<L, S, V, C>(
    config: &DrmmTrainingConfig,
    learner: &mut L,
    train_batches: &mut S,
    valid_batches: &mut V,
    sink: &mut C,
) -> anyhow::Result<TrainingState<L::Snapshot>>
where
    L: Learner,
    S: BatchSource<Batch = L::Batch>,
    V: BatchSource<Batch = L::Batch>,
    C: CheckpointSink<L::Snapshot>,
{
    config.validate()?;

    tracing::info!(
        lr = config.lr,
        batch_size = config.batch_size,
        valid_steps = config.valid_steps,
        save_steps = config.save_steps,
        valid_num = config.valid_num,
        max_steps = ?config.max_steps,
        "Starting training"
    );

    let mut state = TrainingState::new();
    let per_sample = config.batch_size as f64;
    let pb = progress::bar(config.valid_steps, "Train", config.show_progress);
    let start = Instant::now();

    while config.max_steps.map_or(true, |max| state.step < max) {
        let n = state.step + 1;

        let batch = train_batches
            .next_batch()
            .with_context(|| format!("Failed to fetch training batch at step {n}"))?;
        let loss = learner
            .step(&batch)
            .with_context(|| format!("Training step {n} failed"))?;
        pb.set_message(format!("step={n} loss={:.4}", loss / per_sample));
        pb.inc(1);

        if n % config.valid_steps == 0 {
            let valid_loss = validate(
                learner,
                valid_batches,
                config.valid_num,
                config.batch_size,
                config.show_progress,
            )
            .with_context(|| format!("Validation at step {n} failed"))?;
            let improved = state.observe_validation(valid_loss, || learner.snapshot());
            tracing::info!(
                step = n,
                valid_loss = format!("{valid_loss:.4}"),
                min_loss = format!("{:.4}", state.min_loss),
                improved,
                "Validation"
            );
            pb.reset();
        }

        if n % config.save_steps == 0 {
            if let Some((snapshot, loss)) = state.pending_checkpoint() {
                sink.persist(snapshot, loss)
                    .with_context(|| format!("Failed to save checkpoint at step {n}"))?;
                state.mark_persisted();
                pb.println(format!("step {n}: saved model with validation loss {loss:.4}"));
                tracing::info!(step = n, loss, "Saved best model");
            }
        }

        state.step = n;
    }

    pb.finish_and_clear();
    tracing::info!(
        steps = state.step,
        min_loss = state.min_loss,
        saved_loss = state.prev_loss,
        saves = state.saves,
        elapsed_secs = format!("{:.1}", start.elapsed().as_secs_f64()),
        "Training loop finished"
    );
    Ok(state)
}
