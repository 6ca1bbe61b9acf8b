//! Command-line parsing for the `gmm` binary.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. Parsed arguments are turned into plain config structs in
//! `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gmm", version, about = "One-dimensional Gaussian mixture fitting (EM)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a mixture with EM (optionally multi-start), print a summary, and optionally export.
    Fit(FitArgs),
    /// Print the tab-separated histogram and the estimator's proposed mixture.
    Histogram(HistogramArgs),
    /// Categorize samples with a saved model JSON.
    Classify(ClassifyArgs),
}

/// Where samples come from. Exactly one of `--input` / `--demo`.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// CSV file with a header row.
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "demo", required_unless_present = "demo")]
    pub input: Option<PathBuf>,

    /// Column to read (default: first column).
    #[arg(long, requires = "input")]
    pub column: Option<String>,

    /// Use synthetic two-cluster data: 30% N(1, 1) + 70% N(4, 2²).
    #[arg(long)]
    pub demo: bool,

    /// Number of demo samples.
    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub samples: usize,

    /// Random seed for demo samples.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for `gmm fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Seed means (comma-separated). Omit to seed from the histogram estimator.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub means: Vec<f64>,

    /// Seed variances (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub variances: Vec<f64>,

    /// Seed weights (comma-separated, renormalized; default equal).
    #[arg(long, value_delimiter = ',')]
    pub weights: Vec<f64>,

    /// Run the multi-start search instead of a single EM fit.
    #[arg(long)]
    pub search: bool,

    /// Maximum EM iterations per fit.
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,

    /// Relative log-likelihood change that counts as converged.
    #[arg(long, default_value_t = 1e-5)]
    pub tolerance: f64,

    /// Maximum search rounds (with `--search`).
    #[arg(long, default_value_t = 100)]
    pub max_rounds: usize,

    /// Neighbor reach (bins) for the histogram estimator (default: 5% of bins).
    #[arg(long)]
    pub min_gap: Option<usize>,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,

    /// Export per-sample classifications to CSV.
    #[arg(long = "export-classes", value_name = "CSV")]
    pub export_classes: Option<PathBuf>,
}

/// Options for `gmm histogram`.
#[derive(Debug, Args, Clone)]
pub struct HistogramArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Lower edge (default: sample minimum).
    #[arg(long, allow_hyphen_values = true)]
    pub low: Option<f64>,

    /// Upper edge (default: sample maximum).
    #[arg(long, allow_hyphen_values = true)]
    pub high: Option<f64>,

    /// Bin count (default: odd `sqrt(n)` in [3, 101]).
    #[arg(long)]
    pub bins: Option<usize>,

    /// Neighbor reach (bins) for the estimator.
    #[arg(long)]
    pub min_gap: Option<usize>,
}

/// Options for `gmm classify`.
#[derive(Debug, Args, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Model JSON produced by `gmm fit --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Export per-sample classifications to CSV.
    #[arg(long = "export-classes", value_name = "CSV")]
    pub export_classes: Option<PathBuf>,
}
