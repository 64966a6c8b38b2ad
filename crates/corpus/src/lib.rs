//! Relevance-judgement corpus for pairwise ranking.
//!
//! Loads TREC-style qrels, topics and documents from JSON, tokenizes them
//! against a pretrained word-vector vocabulary, and builds
//! (query, positive document, negative document) training pairs. The
//! [`BatchCycler`] turns a finite pair set into an unbounded batch stream.
//!
//! This crate has no ML-framework dependency: token ids stay as `u32` and
//! are converted to tensors by the consumer.

pub mod cycler;
pub mod embeddings;
pub mod error;
pub mod pairs;
pub mod reader;
pub mod tokenizer;
pub mod types;

pub use cycler::BatchCycler;
pub use embeddings::WordVectors;
pub use error::CorpusError;
pub use pairs::{PairConfig, RelevanceCorpus, Split};
pub use types::{PairBatch, PairSample, Qrels, TokenMatrix, PAD_ID};
