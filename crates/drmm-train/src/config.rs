//! TOML config loading for the trainer CLI.
//!
//! An optional TOML file has `[training]`, `[data]` and `[model]` sections.
//! Every field is optional; values are layered as built-in defaults < TOML
//! < command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use corpus::PairConfig;
use drmm::model::drmm::DrmmConfig;
use drmm::training::DrmmTrainingConfig;
use serde::Deserialize;

/// Word2vec file used when neither TOML nor CLI names one.
pub const DEFAULT_EMBEDDINGS: &str = "GoogleNews-vectors-negative300.bin";

/// Top-level structure of the trainer TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct TrainToml {
    #[serde(default)]
    pub training: TrainingOverrides,
    #[serde(default)]
    pub data: DataOverrides,
    #[serde(default)]
    pub model: ModelOverrides,
}

/// Optional overrides for [`DrmmTrainingConfig`].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TrainingOverrides {
    pub lr: Option<f64>,
    pub valid_steps: Option<usize>,
    pub save_steps: Option<usize>,
    pub valid_num: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
}

/// Optional overrides for corpus loading and pair sampling.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DataOverrides {
    /// Word2vec text or binary (`.bin`) file.
    pub embeddings: Option<PathBuf>,
    /// Keep only the first N words of the embedding file.
    pub max_vocab: Option<usize>,
    pub negatives_per_positive: Option<usize>,
    pub max_query_len: Option<usize>,
    pub max_doc_len: Option<usize>,
    pub test_ratio: Option<f64>,
}

/// Optional overrides for the DRMM architecture.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ModelOverrides {
    pub nbins: Option<usize>,
    pub hidden: Option<usize>,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub lr: Option<f64>,
    pub valid_steps: Option<usize>,
    pub save_steps: Option<usize>,
    pub valid_num: Option<usize>,
    pub batch_size: Option<usize>,
    pub nbins: Option<usize>,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    pub embeddings: Option<PathBuf>,
    pub max_vocab: Option<usize>,
    pub no_progress: bool,
}

/// Fully resolved settings for one training run.
#[derive(Debug)]
pub struct RunConfig {
    pub training: DrmmTrainingConfig,
    pub pairs: PairConfig,
    pub nbins: usize,
    pub hidden: usize,
    pub embeddings: PathBuf,
    pub max_vocab: Option<usize>,
}

impl RunConfig {
    /// Model config for word vectors of dimension `embed_dim`.
    pub fn model_config(&self, embed_dim: usize) -> DrmmConfig {
        DrmmConfig::new(embed_dim)
            .with_nbins(self.nbins)
            .with_hidden(self.hidden)
    }
}

/// Load and deserialize a [`TrainToml`] from a TOML file.
pub fn load_train_toml(path: &Path) -> anyhow::Result<TrainToml> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: TrainToml = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded training config");
    Ok(config)
}

/// Build the run configuration from defaults, TOML values and CLI flags.
///
/// Priority chain: built-in defaults < TOML values < CLI flags. The result
/// is validated before it is returned.
pub fn build_run_config(file: &TrainToml, cli: &CliOverrides) -> anyhow::Result<RunConfig> {
    let t = &file.training;
    let mut training = DrmmTrainingConfig::new();
    if let Some(v) = cli.lr.or(t.lr) {
        training.lr = v;
    }
    if let Some(v) = cli.valid_steps.or(t.valid_steps) {
        training.valid_steps = v;
    }
    if let Some(v) = cli.save_steps.or(t.save_steps) {
        training.save_steps = v;
    }
    if let Some(v) = cli.valid_num.or(t.valid_num) {
        training.valid_num = v;
    }
    if let Some(v) = cli.batch_size.or(t.batch_size) {
        training.batch_size = v;
    }
    if let Some(v) = cli.seed.or(t.seed) {
        training.seed = v;
    }
    training.max_steps = cli.max_steps.or(t.max_steps);
    training.show_progress = !cli.no_progress;

    let d = &file.data;
    let mut pairs = PairConfig {
        seed: training.seed,
        ..Default::default()
    };
    if let Some(v) = d.negatives_per_positive {
        pairs.negatives_per_positive = v;
    }
    if let Some(v) = d.max_query_len {
        pairs.max_query_len = v;
    }
    if let Some(v) = d.max_doc_len {
        pairs.max_doc_len = v;
    }
    if let Some(v) = d.test_ratio {
        pairs.test_ratio = v;
    }

    let run = RunConfig {
        training,
        pairs,
        nbins: cli.nbins.or(file.model.nbins).unwrap_or(30),
        hidden: file.model.hidden.unwrap_or(5),
        embeddings: cli
            .embeddings
            .clone()
            .or_else(|| d.embeddings.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EMBEDDINGS)),
        max_vocab: cli.max_vocab.or(d.max_vocab),
    };

    run.training.validate()?;
    run.pairs.validate()?;
    // The embedding dimension is unknown until the vectors are loaded; any
    // positive value checks the remaining fields.
    run.model_config(1).validate()?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_toml() {
        let toml_str = r#"
[training]
lr = 0.01
valid_steps = 100
save_steps = 200
valid_num = 10
batch_size = 16
max_steps = 1000
seed = 7

[data]
embeddings = "vectors.txt"
max_vocab = 50000
negatives_per_positive = 5
max_query_len = 8
max_doc_len = 256
test_ratio = 0.1

[model]
nbins = 20
hidden = 10
"#;
        let config: TrainToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.training.valid_steps, Some(100));
        assert_eq!(config.training.max_steps, Some(1000));
        assert_eq!(config.data.embeddings.as_deref(), Some(Path::new("vectors.txt")));
        assert_eq!(config.data.max_vocab, Some(50000));
        assert_eq!(config.model.nbins, Some(20));
        assert_eq!(config.model.hidden, Some(10));
    }

    #[test]
    fn test_sections_are_optional() {
        let config: TrainToml = toml::from_str("[model]\nnbins = 12\n").unwrap();
        assert!(config.training.lr.is_none());
        assert!(config.data.embeddings.is_none());
        assert_eq!(config.model.nbins, Some(12));
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let run = build_run_config(&TrainToml::default(), &CliOverrides::default()).unwrap();
        assert_eq!(run.training.valid_steps, 5000);
        assert_eq!(run.training.save_steps, 5000);
        assert_eq!(run.training.valid_num, 250);
        assert_eq!(run.training.batch_size, 8);
        assert!((run.training.lr - 1e-3).abs() < 1e-12);
        assert!(run.training.max_steps.is_none());
        assert!(run.training.show_progress);
        assert_eq!(run.nbins, 30);
        assert_eq!(run.hidden, 5);
        assert_eq!(run.embeddings, PathBuf::from(DEFAULT_EMBEDDINGS));
        assert_eq!(run.pairs, PairConfig::default());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let file: TrainToml = toml::from_str(
            r#"
[training]
valid_steps = 100
batch_size = 16
seed = 3

[model]
nbins = 20
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            valid_steps: Some(50),
            nbins: Some(40),
            no_progress: true,
            ..Default::default()
        };

        let run = build_run_config(&file, &cli).unwrap();
        assert_eq!(run.training.valid_steps, 50, "CLI beats TOML");
        assert_eq!(run.training.batch_size, 16, "TOML beats default");
        assert_eq!(run.nbins, 40);
        assert_eq!(run.pairs.seed, 3, "pair sampling follows the run seed");
        assert!(!run.training.show_progress);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cli = CliOverrides {
            save_steps: Some(0),
            ..Default::default()
        };
        assert!(build_run_config(&TrainToml::default(), &cli).is_err());

        let cli = CliOverrides {
            nbins: Some(1),
            ..Default::default()
        };
        assert!(build_run_config(&TrainToml::default(), &cli).is_err());

        let file: TrainToml = toml::from_str("[data]\ntest_ratio = 1.5\n").unwrap();
        assert!(build_run_config(&file, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_model_config_carries_embed_dim() {
        let run = build_run_config(&TrainToml::default(), &CliOverrides::default()).unwrap();
        let model = run.model_config(300);
        assert_eq!(model.embed_dim, 300);
        assert_eq!(model.nbins, 30);
    }
}
