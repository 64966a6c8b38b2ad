//! Persisting model snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};

use crate::model::drmm::{Drmm, DrmmConfig};
use crate::training::error::TrainError;

/// Destination for snapshots that passed the save gate.
pub trait CheckpointSink<S> {
    fn persist(&mut self, snapshot: &S, loss: f64) -> Result<(), TrainError>;
}

/// Writes the parameter record of a [`Drmm`] to a single file.
///
/// Only parameters are stored (no optimizer state, step or config). The
/// record is encoded in memory, written next to the target and renamed over
/// it, so a crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> TrainError {
        TrainError::CheckpointIo {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Atomically replace the checkpoint file with `bytes`.
    fn write_atomic(&self, bytes: &[u8]) -> Result<(), TrainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, bytes).map_err(|e| self.io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))
    }
}

impl<B: Backend> CheckpointSink<Drmm<B>> for CheckpointFile {
    fn persist(&mut self, snapshot: &Drmm<B>, loss: f64) -> Result<(), TrainError> {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        let bytes = Recorder::<B>::record(&recorder, snapshot.clone().into_record(), ())
            .map_err(|e| TrainError::Record(format!("failed to encode model: {e}")))?;
        self.write_atomic(&bytes)?;
        tracing::info!(path = %self.path.display(), loss, bytes = bytes.len(), "Checkpoint written");
        Ok(())
    }
}

/// Load a DRMM for scoring from a checkpoint file.
///
/// Creates a fresh model from config, then loads saved weights on top. The
/// config must match the one the checkpoint was trained with.
pub fn load_checkpoint<B: Backend>(
    path: &Path,
    config: &DrmmConfig,
    device: &B::Device,
) -> Result<Drmm<B>, TrainError> {
    let bytes = fs::read(path).map_err(|source| TrainError::CheckpointIo {
        path: path.to_path_buf(),
        source,
    })?;
    let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
    let record = Recorder::<B>::load(&recorder, bytes, device)
        .map_err(|e| TrainError::Record(format!("failed to decode {}: {e}", path.display())))?;
    Ok(config.init::<B>(device).load_record(record))
}
