//! Topic split and pairwise sample construction.
//!
//! A [`RelevanceCorpus`] holds tokenized queries, tokenized judged documents
//! and the qrels that link them. [`RelevanceCorpus::pairs`] expands one split
//! into (query, relevant doc, non-relevant doc) samples.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::embeddings::WordVectors;
use crate::error::CorpusError;
use crate::reader::{read_documents, read_qrels, read_topics, DocumentRecord};
use crate::types::{PairSample, Qrels};

/// Which side of the topic split to draw pairs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Tokenization and pair-sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PairConfig {
    /// Negatives drawn (with replacement) per relevant document.
    pub negatives_per_positive: usize,
    /// Query truncation length in tokens.
    pub max_query_len: usize,
    /// Document truncation length in tokens.
    pub max_doc_len: usize,
    /// Fraction of topics (by sorted id, taken from the end) held out for test.
    pub test_ratio: f64,
    /// Seed for negative sampling.
    pub seed: u64,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            negatives_per_positive: 3,
            max_query_len: 16,
            max_doc_len: 512,
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

impl PairConfig {
    /// Reject parameters that would produce an empty or degenerate dataset.
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.negatives_per_positive == 0 {
            return Err(CorpusError::Config("negatives_per_positive must be > 0".into()));
        }
        if self.max_query_len == 0 || self.max_doc_len == 0 {
            return Err(CorpusError::Config("max_query_len and max_doc_len must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.test_ratio) || self.test_ratio.is_nan() {
            return Err(CorpusError::Config(format!(
                "test_ratio must be in [0, 1), got {}",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

/// Tokenized queries and documents plus their relevance judgements.
#[derive(Debug, Clone)]
pub struct RelevanceCorpus {
    queries: BTreeMap<String, Arc<[u32]>>,
    docs: HashMap<String, Arc<[u32]>>,
    qrels: Qrels,
    test_ratio: f64,
}

impl RelevanceCorpus {
    /// Load qrels, topics and documents from disk and encode them against
    /// `vectors`. Only documents that appear in the qrels are read into memory.
    pub fn load(
        qrels_path: &Path,
        topics_path: &Path,
        docs_dir: &Path,
        vectors: &WordVectors,
        config: &PairConfig,
    ) -> Result<Self, CorpusError> {
        config.validate()?;
        let qrels = read_qrels(qrels_path)?;
        let topics = read_topics(topics_path)?;

        let wanted: HashSet<&str> = qrels
            .values()
            .flat_map(|judged| judged.keys().map(String::as_str))
            .collect();
        let docs = read_documents(docs_dir, &wanted, |record: &DocumentRecord| {
            vectors.encode(&record.full_text(), config.max_doc_len)
        })?;

        Ok(Self::from_parts(
            topics
                .iter()
                .map(|(id, text)| (id.clone(), vectors.encode(text, config.max_query_len))),
            docs,
            qrels,
            config.test_ratio,
        ))
    }

    /// Assemble a corpus from already-encoded parts.
    pub fn from_parts(
        queries: impl IntoIterator<Item = (String, Vec<u32>)>,
        docs: impl IntoIterator<Item = (String, Vec<u32>)>,
        qrels: Qrels,
        test_ratio: f64,
    ) -> Self {
        Self {
            queries: queries.into_iter().map(|(id, q)| (id, Arc::from(q))).collect(),
            docs: docs.into_iter().map(|(id, d)| (id, Arc::from(d))).collect(),
            qrels,
            test_ratio,
        }
    }

    /// Topic ids belonging to a split.
    ///
    /// Judged topics are sorted; the last `ceil(n * test_ratio)` go to test.
    pub fn topics(&self, split: Split) -> Vec<&str> {
        let all: Vec<&str> = self.qrels.keys().map(String::as_str).collect();
        let n_test = (all.len() as f64 * self.test_ratio).ceil() as usize;
        let n_train = all.len().saturating_sub(n_test);
        match split {
            Split::Train => all[..n_train].to_vec(),
            Split::Test => all[n_train..].to_vec(),
        }
    }

    /// Build pair samples for a split.
    ///
    /// Each relevant document of a topic is paired with
    /// `negatives_per_positive` non-relevant documents of the same topic,
    /// drawn uniformly with replacement. Sampling is seeded per split so the
    /// test pairs are identical across runs.
    pub fn pairs(&self, split: Split, config: &PairConfig) -> Result<Vec<PairSample>, CorpusError> {
        let split_salt = match split {
            Split::Train => 0x7472_6169_6e00,
            Split::Test => 0x7465_7374_0000,
        };
        let mut rng = StdRng::seed_from_u64(config.seed ^ split_salt);
        let mut samples = Vec::new();
        let mut skipped = 0usize;
        let mut missing_docs = 0usize;

        for topic_id in self.topics(split) {
            let Some(query) = self.queries.get(topic_id).filter(|q| !q.is_empty()) else {
                tracing::warn!(topic = topic_id, "No in-vocabulary query tokens, skipping topic");
                skipped += 1;
                continue;
            };

            let mut positives = Vec::new();
            let mut negatives = Vec::new();
            for (doc_id, &relevance) in &self.qrels[topic_id] {
                match self.docs.get(doc_id) {
                    Some(doc) if relevance > 0 => positives.push(doc),
                    Some(doc) => negatives.push(doc),
                    None => missing_docs += 1,
                }
            }
            if positives.is_empty() || negatives.is_empty() {
                tracing::warn!(
                    topic = topic_id,
                    positives = positives.len(),
                    negatives = negatives.len(),
                    "Topic lacks positive or negative documents, skipping"
                );
                skipped += 1;
                continue;
            }

            for pos_doc in positives {
                for _ in 0..config.negatives_per_positive {
                    let neg_doc = negatives.choose(&mut rng).copied().unwrap_or(pos_doc);
                    samples.push(PairSample {
                        topic_id: topic_id.to_string(),
                        query: Arc::clone(query),
                        pos_doc: Arc::clone(pos_doc),
                        neg_doc: Arc::clone(neg_doc),
                    });
                }
            }
        }

        if missing_docs > 0 {
            tracing::warn!(%split, missing_docs, "Judged documents not found in docs dir");
        }
        if samples.is_empty() {
            return Err(CorpusError::EmptyDataset(format!(
                "no {split} pairs could be built ({skipped} topics skipped)"
            )));
        }
        tracing::info!(%split, pairs = samples.len(), skipped_topics = skipped, "Built pair samples");
        Ok(samples)
    }
}
