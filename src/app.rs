//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into run configs
//! - runs the pipeline and prints reports
//! - writes optional exports

use clap::Parser;
use env_logger::{Builder, Env};
use log::info;

use crate::cli::{ClassifyArgs, Command, FitArgs, HistogramArgs, SourceArgs};
use crate::domain::{ClassifyConfig, FitConfig, HistogramConfig, ModelFile, SampleSource};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable holding the log filter (e.g. `debug`, `gmm_fit=trace`).
pub const LOG_ENV: &str = "GMM_LOG";

/// Entry point for the `gmm` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Histogram(args) => handle_histogram(args),
        Command::Classify(args) => handle_classify(args),
    }
}

fn init_logging() {
    let env = Env::new().filter_or(LOG_ENV, "info");
    Builder::from_env(env).format_timestamp(None).try_init().ok();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!("{}", crate::report::format_run_summary(&run));

    if let Some(path) = &config.export_model {
        let model = ModelFile::from_fit(&run.fit, run.samples.values.len());
        crate::io::write_model_json(path, &model)?;
        info!("Wrote model to '{}'.", path.display());
    }
    if let Some(path) = &config.export_classes {
        crate::io::write_classes_csv(path, &run.samples.values, &run.categories)?;
        info!("Wrote classifications to '{}'.", path.display());
    }

    Ok(())
}

fn handle_histogram(args: HistogramArgs) -> Result<(), AppError> {
    let config = histogram_config_from_args(&args);
    let output = pipeline::run_histogram(&config)?;
    print!("{}", crate::report::format_histogram_report(&output));
    Ok(())
}

fn handle_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let config = classify_config_from_args(&args);
    let output = pipeline::run_classify(&config)?;

    println!("{}", crate::report::format_classify_summary(&output));

    if let Some(path) = &config.export_classes {
        crate::io::write_classes_csv(path, &output.samples.values, &output.categories)?;
        info!("Wrote classifications to '{}'.", path.display());
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        source: source_from_args(&args.source),
        means: args.means.clone(),
        variances: args.variances.clone(),
        weights: args.weights.clone(),
        search: args.search,
        max_iterations: args.max_iterations,
        tolerance: args.tolerance,
        max_rounds: args.max_rounds,
        min_gap: args.min_gap,
        export_model: args.export_model.clone(),
        export_classes: args.export_classes.clone(),
    }
}

pub fn histogram_config_from_args(args: &HistogramArgs) -> HistogramConfig {
    HistogramConfig {
        source: source_from_args(&args.source),
        low: args.low,
        high: args.high,
        bins: args.bins,
        min_gap: args.min_gap,
    }
}

pub fn classify_config_from_args(args: &ClassifyArgs) -> ClassifyConfig {
    ClassifyConfig {
        source: source_from_args(&args.source),
        model: args.model.clone(),
        export_classes: args.export_classes.clone(),
    }
}

fn source_from_args(args: &SourceArgs) -> SampleSource {
    match &args.input {
        Some(path) if !args.demo => SampleSource::Csv {
            path: path.clone(),
            column: args.column.clone(),
        },
        _ => SampleSource::Demo {
            count: args.samples,
            seed: args.seed,
        },
    }
}
