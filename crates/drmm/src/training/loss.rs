//! Pairwise hinge loss for DRMM training.

use burn::prelude::*;

use crate::model::drmm::Drmm;

/// Hinge margin between relevant and non-relevant scores.
pub const MARGIN: f64 = 1.0;

/// Pairwise hinge loss: `Σ max(0, margin − pos + neg)`.
///
/// Summed over the batch, not averaged; callers that want a per-sample
/// value divide by the batch size themselves.
///
/// # Arguments
/// - `pos_scores`: shape `(batch,)`, scores of relevant documents
/// - `neg_scores`: shape `(batch,)`, scores of non-relevant documents
///
/// # Returns
/// Scalar loss tensor of shape `(1,)`.
pub fn hinge_loss<B: Backend>(pos_scores: Tensor<B, 1>, neg_scores: Tensor<B, 1>) -> Tensor<B, 1> {
    (neg_scores - pos_scores + MARGIN).clamp_min(0.0).sum()
}

/// Score a query against its positive and negative documents and return the
/// batch hinge loss.
///
/// Embeddings are `(batch, len, dim)`; both documents share the query and
/// its lengths.
pub fn pairwise_loss<B: Backend>(
    model: &Drmm<B>,
    query: Tensor<B, 3>,
    pos_doc: Tensor<B, 3>,
    neg_doc: Tensor<B, 3>,
    query_lengths: &[usize],
) -> Tensor<B, 1> {
    let pos = model.score(query.clone(), pos_doc, query_lengths);
    let neg = model.score(query, neg_doc, query_lengths);
    hinge_loss(pos, neg)
}
