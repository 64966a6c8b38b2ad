//! Wiring for the `drmm-train` command: load data, build the learner, run
//! the training loop, report.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use burn::optim::AdamWConfig;
use burn::tensor::backend::AutodiffBackend;
use corpus::{BatchCycler, RelevanceCorpus, Split, WordVectors};
use drmm::model::drmm::Drmm;
use drmm::model::embedding::FrozenEmbedding;
use drmm::training::{train, BatchSource, CheckpointFile, DrmmLearner};

use crate::config::{build_run_config, load_train_toml, CliOverrides, TrainToml};

#[cfg(feature = "wgpu")]
type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
#[cfg(not(feature = "wgpu"))]
type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

/// Arguments for the training command.
#[derive(Debug, Clone)]
pub struct TrainArgs {
    pub qrels_file: PathBuf,
    pub topics_file: PathBuf,
    pub docs_dir: PathBuf,
    pub model_path: PathBuf,
    pub config: Option<PathBuf>,
    pub overrides: CliOverrides,
}

/// What a finished (step-limited) run reports.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    /// Best validation loss seen; infinite if validation never ran.
    pub best_loss: f64,
    /// Loss of the persisted model, if anything was written.
    pub saved_loss: Option<f64>,
    pub saves: usize,
    pub train_passes: usize,
    pub valid_passes: usize,
    pub model_path: PathBuf,
    pub elapsed: Duration,
}

/// Train on the default backend and print a summary.
pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let device = Default::default();
    let summary = run_train_on::<TrainBackend>(args, &device)?;

    println!("\n--- Training Summary ---");
    println!("Steps: {}", summary.steps);
    if summary.best_loss.is_finite() {
        println!("Best validation loss: {:.4}", summary.best_loss);
    } else {
        println!("Best validation loss: n/a (no validation ran)");
    }
    match summary.saved_loss {
        Some(loss) => println!("Saved model: {} (loss {loss:.4}, {} writes)", summary.model_path.display(), summary.saves),
        None => println!("Saved model: none"),
    }
    println!("Passes: train {}, validation {}", summary.train_passes, summary.valid_passes);
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    Ok(())
}

/// Run the full pipeline on backend `B`.
///
/// Returns only when `max_steps` is configured; otherwise training runs
/// until the process is stopped.
pub fn run_train_on<B: AutodiffBackend>(args: TrainArgs, device: &B::Device) -> anyhow::Result<RunSummary> {
    let start = Instant::now();
    let file = match &args.config {
        Some(path) => load_train_toml(path)?,
        None => TrainToml::default(),
    };
    let run = build_run_config(&file, &args.overrides)?;
    tracing::info!(device = ?device, "Using device");

    let vectors = WordVectors::load(&run.embeddings, run.max_vocab)
        .with_context(|| format!("Failed to load word vectors from {}", run.embeddings.display()))?;
    let corpus = RelevanceCorpus::load(&args.qrels_file, &args.topics_file, &args.docs_dir, &vectors, &run.pairs)
        .context("Failed to load relevance corpus")?;
    let train_pairs = corpus.pairs(Split::Train, &run.pairs)?;
    let test_pairs = corpus.pairs(Split::Test, &run.pairs)?;
    tracing::info!(
        train_pairs = train_pairs.len(),
        test_pairs = test_pairs.len(),
        vocab = vectors.vocab_size(),
        dim = vectors.dim(),
        "Corpus ready"
    );

    let batch_size = run.training.batch_size;
    let mut train_batches = BatchCycler::shuffled(train_pairs, batch_size, run.training.seed)?;
    let mut valid_batches = BatchCycler::sequential(test_pairs, batch_size)?;

    let model_config = run.model_config(vectors.dim());
    B::seed(run.training.seed);
    let model = model_config.init::<B>(device);
    let embedding = FrozenEmbedding::from_vectors(&vectors, device);
    drop(vectors);
    let mut learner = DrmmLearner::new(model, embedding, AdamWConfig::new().init::<B, Drmm<B>>(), run.training.lr);
    let mut sink = CheckpointFile::new(&args.model_path);

    let state = train(&run.training, &mut learner, &mut train_batches, &mut valid_batches, &mut sink)?;

    Ok(RunSummary {
        steps: state.step,
        best_loss: state.min_loss,
        saved_loss: (state.saves > 0).then_some(state.prev_loss),
        saves: state.saves,
        train_passes: BatchSource::passes(&train_batches),
        valid_passes: BatchSource::passes(&valid_batches),
        model_path: args.model_path,
        elapsed: start.elapsed(),
    })
}
