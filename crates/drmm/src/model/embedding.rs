use burn::prelude::*;
use burn::tensor::TensorData;
use corpus::{TokenMatrix, WordVectors};

use crate::model::bridge::token_ids_to_tensor;

/// Frozen word-vector table living on a (non-autodiff) backend.
///
/// Not a [`Module`]: it carries no trainable parameters and is never part of
/// a checkpoint. Row 0 is the zero padding vector; ids outside the table
/// resolve to it.
#[derive(Debug, Clone)]
pub struct FrozenEmbedding<B: Backend> {
    weight: Tensor<B, 2>,
}

impl<B: Backend> FrozenEmbedding<B> {
    /// Upload a word-vector table to `device`.
    pub fn from_vectors(vectors: &WordVectors, device: &B::Device) -> Self {
        let data = TensorData::new(vectors.data().to_vec(), [vectors.rows(), vectors.dim()]);
        Self {
            weight: Tensor::from_data(data, device),
        }
    }

    /// Number of rows, including the padding row.
    pub fn rows(&self) -> usize {
        self.weight.dims()[0]
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.weight.dims()[1]
    }

    /// Look up a padded token matrix.
    ///
    /// Output shape: `(rows, cols, dim)`.
    pub fn lookup(&self, tokens: &TokenMatrix) -> Tensor<B, 3> {
        let indices = token_ids_to_tensor::<B>(tokens, self.rows(), &self.weight.device());
        self.weight
            .clone()
            .select(0, indices)
            .reshape([tokens.rows, tokens.cols, self.dim()])
    }
}
