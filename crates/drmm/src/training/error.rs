use std::path::PathBuf;

use crate::training::learner::Mode;

/// Errors from the DRMM training components.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// An operation was called while the learner was in the wrong mode.
    #[error("{operation} is not allowed in {mode} mode")]
    WrongMode { operation: &'static str, mode: Mode },
    /// The loss came back NaN or infinite.
    #[error("non-finite loss: {0}")]
    NonFiniteLoss(f64),
    /// Invalid hyperparameters, caught before training starts.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Error from the data layer.
    #[error("data error: {0}")]
    Data(#[from] corpus::CorpusError),
    /// Reading or writing a checkpoint file failed.
    #[error("checkpoint I/O on {path}: {source}")]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// burn could not encode or decode a parameter record.
    #[error("checkpoint record: {0}")]
    Record(String),
    /// Error from a model, optimizer or batch-source collaborator.
    #[error("collaborator error: {0}")]
    Collaborator(#[source] anyhow::Error),
}
