//! The learner seam: everything the training loop needs from a model and its
//! optimizer, plus the burn implementation for DRMM.

use std::fmt;

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use corpus::PairBatch;

use crate::model::drmm::Drmm;
use crate::model::embedding::FrozenEmbedding;
use crate::training::error::TrainError;
use crate::training::loss::pairwise_loss;

/// Whether a learner accepts parameter updates or only evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Training,
    Inference,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Inference => write!(f, "inference"),
        }
    }
}

/// A trainable scorer with an explicit training/inference mode.
///
/// `step` is only valid in [`Mode::Training`] and `evaluate` only in
/// [`Mode::Inference`]. Both return the summed batch loss.
pub trait Learner {
    type Batch;
    /// Immutable copy of the parameters, detached from later updates.
    type Snapshot;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    /// Forward, backward and one optimizer update.
    fn step(&mut self, batch: &Self::Batch) -> Result<f64, TrainError>;

    /// Loss without gradient tracking or parameter updates.
    fn evaluate(&mut self, batch: &Self::Batch) -> Result<f64, TrainError>;

    fn snapshot(&self) -> Self::Snapshot;
}

/// DRMM on an autodiff backend, with frozen word vectors on its inner
/// backend and any burn optimizer (AdamW in the trainer binary).
pub struct DrmmLearner<B: AutodiffBackend, O> {
    model: Drmm<B>,
    embedding: FrozenEmbedding<B::InnerBackend>,
    optimizer: O,
    lr: f64,
    mode: Mode,
}

impl<B, O> DrmmLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Drmm<B>, B>,
{
    /// Wrap a freshly initialized model. Starts in [`Mode::Training`].
    pub fn new(model: Drmm<B>, embedding: FrozenEmbedding<B::InnerBackend>, optimizer: O, lr: f64) -> Self {
        Self {
            model,
            embedding,
            optimizer,
            lr,
            mode: Mode::Training,
        }
    }

    pub fn model(&self) -> &Drmm<B> {
        &self.model
    }

    pub fn into_model(self) -> Drmm<B> {
        self.model
    }

    fn embed(&self, batch: &PairBatch) -> [Tensor<B::InnerBackend, 3>; 3] {
        [
            self.embedding.lookup(&batch.query),
            self.embedding.lookup(&batch.pos_doc),
            self.embedding.lookup(&batch.neg_doc),
        ]
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

fn finite(loss: f64) -> Result<f64, TrainError> {
    if loss.is_finite() {
        Ok(loss)
    } else {
        Err(TrainError::NonFiniteLoss(loss))
    }
}

impl<B, O> Learner for DrmmLearner<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Drmm<B>, B>,
{
    type Batch = PairBatch;
    type Snapshot = Drmm<B::InnerBackend>;

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn step(&mut self, batch: &PairBatch) -> Result<f64, TrainError> {
        self.require("step", Mode::Training)?;
        let [query, pos_doc, neg_doc] = self.embed(batch);

        let loss = pairwise_loss(
            &self.model,
            Tensor::from_inner(query),
            Tensor::from_inner(pos_doc),
            Tensor::from_inner(neg_doc),
            &batch.query_lengths,
        );
        let value: f64 = loss.clone().into_scalar().elem();
        let value = finite(value)?;

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(self.lr, self.model.clone(), grads);
        Ok(value)
    }

    fn evaluate(&mut self, batch: &PairBatch) -> Result<f64, TrainError> {
        self.require("evaluate", Mode::Inference)?;
        let [query, pos_doc, neg_doc] = self.embed(batch);
        let model = self.model.valid();
        let loss = pairwise_loss(&model, query, pos_doc, neg_doc, &batch.query_lengths);
        let value: f64 = loss.into_scalar().elem();
        finite(value)
    }

    fn snapshot(&self) -> Drmm<B::InnerBackend> {
        self.model.valid()
    }
}
