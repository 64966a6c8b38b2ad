//! Data types for relevance judgements, training pairs and padded batches.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Token id reserved for padding. Row 0 of every embedding table is zero.
pub const PAD_ID: u32 = 0;

/// Relevance judgements: topic id → (document id → graded relevance).
///
/// Relevance `> 0` marks a relevant document, `0` a judged non-relevant one.
pub type Qrels = BTreeMap<String, BTreeMap<String, i32>>;

/// One pairwise training example.
///
/// Token sequences are shared across samples through `Arc`, so cloning a
/// sample (as the batch cycler does on every draw) never copies tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSample {
    /// Topic the pair was drawn from.
    pub topic_id: String,
    /// Query token ids, unpadded. Never empty.
    pub query: Arc<[u32]>,
    /// Token ids of a relevant document.
    pub pos_doc: Arc<[u32]>,
    /// Token ids of a judged non-relevant document.
    pub neg_doc: Arc<[u32]>,
}

impl PairSample {
    /// Number of real (non-padding) query tokens.
    pub fn query_len(&self) -> usize {
        self.query.len()
    }
}

/// Row-major `rows × cols` matrix of token ids, right-padded with [`PAD_ID`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatrix {
    pub ids: Vec<u32>,
    pub rows: usize,
    pub cols: usize,
}

impl TokenMatrix {
    /// Pad a set of sequences to the longest one (at least one column).
    pub fn from_rows<'a>(rows: impl ExactSizeIterator<Item = &'a [u32]> + Clone) -> Self {
        let n = rows.len();
        let cols = rows.clone().map(|r| r.len()).max().unwrap_or(0).max(1);
        let mut ids = vec![PAD_ID; n * cols];
        for (i, row) in rows.enumerate() {
            ids[i * cols..i * cols + row.len()].copy_from_slice(row);
        }
        Self { ids, rows: n, cols }
    }

    /// The `i`-th row including padding.
    pub fn row(&self, i: usize) -> &[u32] {
        &self.ids[i * self.cols..(i + 1) * self.cols]
    }
}

/// A collated batch: `(query_ids, pos_doc_ids, neg_doc_ids, query_lengths)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairBatch {
    pub query: TokenMatrix,
    pub pos_doc: TokenMatrix,
    pub neg_doc: TokenMatrix,
    /// Unpadded query length per row; masks query padding in the model.
    pub query_lengths: Vec<usize>,
}

impl PairBatch {
    /// Pad and stack samples into a batch.
    ///
    /// Each matrix is padded independently to its own longest row.
    pub fn collate(samples: &[PairSample]) -> Self {
        Self {
            query: TokenMatrix::from_rows(samples.iter().map(|s| &s.query[..])),
            pos_doc: TokenMatrix::from_rows(samples.iter().map(|s| &s.pos_doc[..])),
            neg_doc: TokenMatrix::from_rows(samples.iter().map(|s| &s.neg_doc[..])),
            query_lengths: samples.iter().map(PairSample::query_len).collect(),
        }
    }

    /// Number of pairs in the batch.
    pub fn len(&self) -> usize {
        self.query_lengths.len()
    }

    /// Whether the batch holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.query_lengths.is_empty()
    }
}
