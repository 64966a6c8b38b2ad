//! Tensor bridge: host-side token matrices and lengths to burn tensors.

use burn::prelude::*;
use burn::tensor::TensorData;
use corpus::{TokenMatrix, PAD_ID};

/// Flatten a padded token matrix into a `(rows * cols,)` index tensor.
///
/// Ids at or beyond `table_rows` are replaced by [`PAD_ID`] so they select
/// the zero padding vector instead of reading out of bounds.
pub fn token_ids_to_tensor<B: Backend>(
    tokens: &TokenMatrix,
    table_rows: usize,
    device: &B::Device,
) -> Tensor<B, 1, Int> {
    let ids: Vec<i64> = tokens
        .ids
        .iter()
        .map(|&id| {
            if (id as usize) < table_rows {
                id as i64
            } else {
                PAD_ID as i64
            }
        })
        .collect();
    let n = ids.len();
    Tensor::from_data(TensorData::new(ids, [n]), device)
}

/// Float mask of shape `(batch, cols)`: 1.0 for the first `lengths[i]`
/// positions of row `i`, 0.0 for padding.
pub fn length_mask<B: Backend>(lengths: &[usize], cols: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut mask = vec![0.0_f32; lengths.len() * cols];
    for (row, &len) in lengths.iter().enumerate() {
        mask[row * cols..row * cols + len.min(cols)].fill(1.0);
    }
    Tensor::from_data(TensorData::new(mask, [lengths.len(), cols]), device)
}

/// Extract f32 values from a burn 1D tensor.
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 1>) -> Vec<f32> {
    tensor.into_data().iter::<f32>().collect()
}
