use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use drmm_train::config::CliOverrides;
use drmm_train::pipeline::{self, TrainArgs};

/// drmm-train: train a Deep Relevance Matching Model with a pairwise hinge loss.
///
/// Numeric options left unset fall back to the `--config` TOML file, then to
/// the built-in defaults shown in each description.
#[derive(Parser)]
#[command(name = "drmm-train", version, about)]
struct Cli {
    /// Qrels JSON: {"<topic>": {"<doc>": <relevance>}}.
    qrels_file: PathBuf,
    /// Topics JSON: {"<topic>": "<query>"} or {"<topic>": {"title": ...}}.
    topics_file: PathBuf,
    /// Directory of document JSON files.
    docs_dir: PathBuf,
    /// Where the best model is written.
    #[arg(long, default_value = "drmm.ckpt")]
    model_path: PathBuf,
    /// Steps between validation passes [default: 5000].
    #[arg(long)]
    valid_steps: Option<usize>,
    /// Steps between checkpoint save points [default: 5000].
    #[arg(long)]
    save_steps: Option<usize>,
    /// Validation batches per pass [default: 250].
    #[arg(long)]
    valid_num: Option<usize>,
    /// Pairs per batch [default: 8].
    #[arg(long)]
    batch_size: Option<usize>,
    /// AdamW learning rate [default: 0.001].
    #[arg(long)]
    lr: Option<f64>,
    /// Matching histogram bins, including the exact-match bin [default: 30].
    #[arg(long)]
    nbins: Option<usize>,
    /// Word2vec text or .bin file [default: GoogleNews-vectors-negative300.bin].
    #[arg(long)]
    embeddings: Option<PathBuf>,
    /// Keep only the first N words of the embedding file.
    #[arg(long)]
    max_vocab: Option<usize>,
    /// Stop after this many steps. Unset trains until interrupted.
    #[arg(long)]
    max_steps: Option<usize>,
    /// Seed for shuffling, pair sampling and initialization [default: 42].
    #[arg(long)]
    seed: Option<u64>,
    /// Path to a TOML file with [training], [data] and [model] sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Disable live progress bars.
    #[arg(long)]
    no_progress: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    pipeline::run_train(TrainArgs {
        qrels_file: cli.qrels_file,
        topics_file: cli.topics_file,
        docs_dir: cli.docs_dir,
        model_path: cli.model_path,
        config: cli.config,
        overrides: CliOverrides {
            lr: cli.lr,
            valid_steps: cli.valid_steps,
            save_steps: cli.save_steps,
            valid_num: cli.valid_num,
            batch_size: cli.batch_size,
            nbins: cli.nbins,
            max_steps: cli.max_steps,
            seed: cli.seed,
            embeddings: cli.embeddings,
            max_vocab: cli.max_vocab,
            no_progress: cli.no_progress,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_positional_and_defaults() {
        let cli = Cli::parse_from(["drmm-train", "qrels.json", "topics.json", "docs/"]);
        assert_eq!(cli.qrels_file, PathBuf::from("qrels.json"));
        assert_eq!(cli.docs_dir, PathBuf::from("docs/"));
        assert_eq!(cli.model_path, PathBuf::from("drmm.ckpt"));
        assert!(cli.valid_steps.is_none());
        assert!(!cli.no_progress);
    }

    #[test]
    fn test_parse_options() {
        let cli = Cli::parse_from([
            "drmm-train",
            "q.json",
            "t.json",
            "d",
            "--model-path",
            "out/best.ckpt",
            "--valid-steps",
            "100",
            "--lr",
            "0.01",
            "--nbins",
            "20",
            "--max-steps",
            "500",
            "--no-progress",
        ]);
        assert_eq!(cli.model_path, PathBuf::from("out/best.ckpt"));
        assert_eq!(cli.valid_steps, Some(100));
        assert_eq!(cli.lr, Some(0.01));
        assert_eq!(cli.nbins, Some(20));
        assert_eq!(cli.max_steps, Some(500));
        assert!(cli.no_progress);
    }

    #[test]
    fn test_missing_positional_is_an_error() {
        assert!(Cli::try_parse_from(["drmm-train", "q.json"]).is_err());
    }
}
