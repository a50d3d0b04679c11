// main.rs
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use caption_prep::{PrepConfig, PrepSummary, Result, run};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Gathers per-item feature files and captions listed in a JSON manifest into
/// one safetensors array store and a JSON index.
#[derive(Parser, Debug)]
#[command(name = "caption-prep", version)]
struct Cli {
    /// Input manifest: [{"file_path": ..., "captions": [...]}, ...]
    #[arg(long)]
    input_json: PathBuf,

    /// Number of items to assign to validation
    #[arg(long)]
    num_val: usize,

    /// Number of test items (withheld until the very end)
    #[arg(long, default_value_t = 0)]
    num_test: usize,

    /// Max caption length in words; longer captions are clipped
    #[arg(long, default_value_t = 16)]
    max_length: usize,

    /// Only words occurring more than this many times enter the vocabulary
    #[arg(long, default_value_t = 5)]
    word_count_threshold: u64,

    #[arg(long, default_value = "data/data.json")]
    output_json: PathBuf,

    #[arg(long, default_value = "data/data.safetensors")]
    output_store: PathBuf,

    /// Every corpus word with its count, most frequent first
    #[arg(long, default_value = "data/word_counts.txt")]
    word_count_file: PathBuf,

    /// Shuffle seed
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Tensor name holding the vector in each feature file
    #[arg(long, default_value = "mp")]
    feature_field: String,

    #[arg(long, default_value_t = 4096)]
    feature_dim: usize,

    #[arg(long, default_value = "UNK")]
    unk_token: String,

    /// How many top words to report
    #[arg(long, default_value_t = 20)]
    top_words: usize,

    /// Draw a progress bar while copying features (needs the `progressbar` feature)
    #[arg(long)]
    progress: bool,
}

impl From<Cli> for PrepConfig {
    fn from(cli: Cli) -> Self {
        PrepConfig {
            input_json: cli.input_json,
            num_val: cli.num_val,
            num_test: cli.num_test,
            max_length: cli.max_length,
            word_count_threshold: cli.word_count_threshold,
            output_json: cli.output_json,
            output_store: cli.output_store,
            word_count_file: cli.word_count_file,
            seed: cli.seed,
            feature_field: cli.feature_field,
            feature_dim: cli.feature_dim,
            unk_token: cli.unk_token,
            top_words: cli.top_words,
            show_progress: cli.progress,
        }
    }
}

/// Logs the outcome of a run; errors are reported by their message and end
/// the process with a failure status.
fn finish(outcome: Result<PrepSummary>) -> ExitCode {
    match outcome {
        Ok(summary) => {
            tracing::info!(
                items = summary.items,
                captions = summary.captions,
                vocab_size = summary.vocab_size,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    finish(run(&cli.into()))
}
