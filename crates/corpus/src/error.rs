use std::path::PathBuf;

/// Errors raised while loading or preparing corpus data.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Filesystem error, tagged with the offending path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON input (qrels, topics, document) failed to parse.
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The word-vector file does not follow the word2vec layout.
    #[error("Malformed word vectors at line {line}: {reason}")]
    EmbeddingFormat { line: usize, reason: String },

    /// A dataset ended up with nothing to iterate over.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Invalid sampling or batching parameter.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CorpusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
