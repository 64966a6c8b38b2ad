use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{softmax, tanh};

use crate::model::bridge::length_mask;
use crate::training::error::TrainError;

/// Cosine similarity at or above this counts as an exact match.
const EXACT_MATCH_THRESHOLD: f64 = 1.0 - 1e-3;
const NORM_EPS: f64 = 1e-8;
/// Added to gating logits of padded query positions before the softmax.
const MASKED_LOGIT_PENALTY: f64 = 1e9;

/// Configuration for the DRMM scorer.
///
/// ```text
/// query (batch, q_len, dim), doc (batch, d_len, dim)
///   → matching histogram (batch, q_len, nbins), log(1 + count)
///   → Linear(nbins→hidden) → tanh → Linear(hidden→1) → tanh   per query term
///   → Σ softmax_over_terms(w · q_term) * term_score
///   → score: (batch,)
/// ```
#[derive(Config, Debug)]
pub struct DrmmConfig {
    /// Word-vector dimension.
    pub embed_dim: usize,
    /// Histogram bins: `nbins - 1` equal-width bins over [-1, 1) plus one
    /// exact-match bin.
    #[config(default = 30)]
    pub nbins: usize,
    /// Hidden width of the matching feed-forward network.
    #[config(default = 5)]
    pub hidden: usize,
}

impl DrmmConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.nbins < 2 {
            return Err(TrainError::InvalidConfig(format!(
                "nbins must be >= 2 (one similarity bin plus the exact-match bin), got {}",
                self.nbins
            )));
        }
        if self.embed_dim == 0 || self.hidden == 0 {
            return Err(TrainError::InvalidConfig(
                "embed_dim and hidden must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize a DRMM model with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Drmm<B> {
        Drmm {
            ffn_in: LinearConfig::new(self.nbins, self.hidden).init(device),
            ffn_out: LinearConfig::new(self.hidden, 1).init(device),
            gate: LinearConfig::new(self.embed_dim, 1).with_bias(false).init(device),
            nbins: self.nbins,
        }
    }
}

/// DRMM relevance scorer.
///
/// Only the matching network and the term gate are trainable; word vectors
/// are supplied already looked up.
#[derive(Module, Debug)]
pub struct Drmm<B: Backend> {
    /// Histogram → hidden.
    pub(crate) ffn_in: Linear<B>,
    /// Hidden → per-term matching score.
    pub(crate) ffn_out: Linear<B>,
    /// Term gating weights: dim → 1, no bias.
    pub(crate) gate: Linear<B>,
    nbins: usize,
}

impl<B: Backend> Drmm<B> {
    /// Score each (query, document) row.
    ///
    /// - `query`: `(batch, q_len, dim)`; positions at or beyond
    ///   `query_lengths[i]` are padding and receive zero gate weight.
    /// - `doc`: `(batch, d_len, dim)`; all-zero rows are padding and do not
    ///   enter the histogram.
    ///
    /// Output shape: `(batch,)`
    pub fn score(&self, query: Tensor<B, 3>, doc: Tensor<B, 3>, query_lengths: &[usize]) -> Tensor<B, 1> {
        let [batch, query_len, _] = query.dims();
        debug_assert_eq!(query_lengths.len(), batch, "one length per query row");
        let device = query.device();

        let hist = matching_histogram(query.clone(), doc, self.nbins);
        let term_scores: Tensor<B, 2> =
            tanh(self.ffn_out.forward(tanh(self.ffn_in.forward(hist)))).squeeze::<2>(2);

        let mask = length_mask::<B>(query_lengths, query_len, &device);
        let logits: Tensor<B, 2> = self.gate.forward(query).squeeze::<2>(2)
            + (mask.clone() - 1.0) * MASKED_LOGIT_PENALTY;
        let gates = softmax(logits, 1) * mask;

        (gates * term_scores).sum_dim(1).squeeze::<1>(1)
    }

    /// Number of histogram bins this model was built with.
    pub fn nbins(&self) -> usize {
        self.nbins
    }
}

/// Scale each vector along the last axis to unit length. Zero vectors stay zero.
fn unit_rows<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 3> {
    let norm = x.clone().powf_scalar(2.0).sum_dim(2).sqrt().clamp_min(NORM_EPS);
    x / norm
}

/// Log-count matching histogram between every query term and the
/// non-padding terms of its document.
///
/// Output shape: `(batch, q_len, nbins)`. Bin `k < nbins - 1` covers cosine
/// similarity `[-1 + k·w, -1 + (k+1)·w)` with `w = 2 / (nbins - 1)`; the last
/// bin counts exact matches.
pub fn matching_histogram<B: Backend>(query: Tensor<B, 3>, doc: Tensor<B, 3>, nbins: usize) -> Tensor<B, 3> {
    // (batch, 1, d_len): 1.0 for real document terms.
    let doc_mask = doc.clone().abs().sum_dim(2).greater_elem(0.0).float().swap_dims(1, 2);

    let sim = unit_rows(query)
        .matmul(unit_rows(doc).swap_dims(1, 2))
        .clamp(-1.0, 1.0);
    let exact = sim.clone().greater_equal_elem(EXACT_MATCH_THRESHOLD).float();
    let inexact = exact.clone().neg() + 1.0;

    let regular = nbins - 1;
    let width = 2.0 / regular as f64;
    let mut counts = Vec::with_capacity(nbins);
    for k in 0..regular {
        let lo = -1.0 + k as f64 * width;
        let mut in_bin = sim.clone().greater_equal_elem(lo).float() * inexact.clone();
        // The top regular bin is closed against the exact-match threshold only.
        if k + 1 < regular {
            in_bin = in_bin * sim.clone().lower_elem(lo + width).float();
        }
        counts.push((in_bin * doc_mask.clone()).sum_dim(2));
    }
    counts.push((exact * doc_mask).sum_dim(2));

    Tensor::cat(counts, 2).log1p()
}
