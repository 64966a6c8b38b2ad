//! Deep Relevance Matching Model (DRMM) for ad-hoc retrieval.
//!
//! Scores (query, document) pairs from matching histograms over frozen
//! pretrained word vectors, gated by a learned per-term importance. Trained
//! with a pairwise hinge loss; the training loop tracks the best validation
//! loss and persists improved snapshots at fixed intervals.

pub mod model;
pub mod training;
