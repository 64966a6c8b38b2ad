//! DRMM training pipeline: pairwise hinge loss, the learner seam over a burn
//! model and optimizer, validation, best-checkpoint gating, and the training
//! loop that ties them together.

pub mod checkpoint;
pub mod error;
pub mod learner;
pub mod loss;
pub mod mocks;
pub mod progress;
pub mod source;
pub mod state;
pub mod trainer;
pub mod validation;

pub use checkpoint::{load_checkpoint, CheckpointFile, CheckpointSink};
pub use error::TrainError;
pub use learner::{DrmmLearner, Learner, Mode};
pub use source::BatchSource;
pub use state::TrainingState;
pub use trainer::{train, DrmmTrainingConfig};
pub use validation::{validate, InferenceGuard};
