//! Shared pipeline logic behind the `fit`, `histogram` and `classify` commands.
//!
//! Keeping the workflow here keeps `app` focused on presentation:
//! samples -> seed (explicit or histogram estimate) -> fit/search -> classify

use log::{info, warn};

use crate::data::generate_demo;
use crate::domain::{
    Category, ClassifyConfig, FitConfig, FitResult, HistogramConfig, MixtureParameters, ModelFile,
    SampleSource,
};
use crate::error::{AppError, GmmError};
use crate::fit::{FitOptions, SearchOptions, SearchResult, fit, multiple_fits};
use crate::histogram::{GmmEstimate, Histogram, default_min_gap};
use crate::io::{RowError, load_samples, read_model_json};
use crate::models::{categorize, category_counts, log_likelihood_of};

/// Samples plus where they came from.
#[derive(Debug, Clone)]
pub struct LoadedSamples {
    pub values: Vec<f64>,
    /// Human-readable origin, e.g. `data.csv [value]` or `demo (seed=42)`.
    pub origin: String,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

/// How the EM seed was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedOrigin {
    /// `--means/--variances/--weights`.
    Explicit,
    /// Histogram estimator over `bins` bins.
    Histogram { bins: usize, min_gap: usize },
    /// Estimator found no interval; one component from the sample moments.
    Moments,
}

/// All computed outputs of a single `gmm fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub samples: LoadedSamples,
    pub seed: MixtureParameters,
    pub seed_origin: SeedOrigin,
    pub fit: FitResult,
    pub search: Option<SearchResult>,
    pub categories: Vec<Category>,
    pub counts: Vec<usize>,
    pub unassigned: usize,
}

/// Outputs of `gmm histogram`.
#[derive(Debug, Clone)]
pub struct HistogramOutput {
    pub samples: LoadedSamples,
    pub histogram: Histogram,
    pub min_gap: usize,
    /// The estimator may reject a histogram that still lists fine (e.g. all
    /// samples outside the requested range).
    pub estimate: Result<GmmEstimate, GmmError>,
}

/// Outputs of `gmm classify`.
#[derive(Debug, Clone)]
pub struct ClassifyOutput {
    pub samples: LoadedSamples,
    pub model: ModelFile,
    pub params: MixtureParameters,
    pub categories: Vec<Category>,
    pub counts: Vec<usize>,
    pub unassigned: usize,
    /// Log-likelihood of the new samples under the model; `None` when a
    /// sample's density underflows.
    pub log_likelihood: Option<f64>,
}

/// Load samples from CSV or synthesize the demo set.
pub fn load(source: &SampleSource) -> Result<LoadedSamples, AppError> {
    let samples = match source {
        SampleSource::Csv { path, column } => {
            let ingest = load_samples(path, column.as_deref())?;
            if !ingest.row_errors.is_empty() {
                warn!(
                    "Skipped {} of {} rows in '{}'.",
                    ingest.row_errors.len(),
                    ingest.rows_read,
                    path.display()
                );
            }
            LoadedSamples {
                origin: format!("{} [{}]", path.display(), ingest.column),
                rows_read: ingest.rows_read,
                values: ingest.values,
                row_errors: ingest.row_errors,
            }
        }
        SampleSource::Demo { count, seed } => {
            let values = generate_demo(*count, *seed)?;
            LoadedSamples {
                origin: format!("demo 30% N(1, 1) + 70% N(4, 2^2) (seed={seed})"),
                rows_read: values.len(),
                values,
                row_errors: Vec::new(),
            }
        }
    };
    info!("Loaded {} samples from {}.", samples.values.len(), samples.origin);
    Ok(samples)
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let samples = load(&config.source)?;
    let data = &samples.values;

    let (seed, seed_origin) = initial_parameters(config, data)?;

    let fit_opts = FitOptions {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
    };
    let (fitted, search) = if config.search {
        let opts = SearchOptions {
            max_rounds: config.max_rounds,
            fit: fit_opts,
        };
        let result = multiple_fits(data, &seed, &opts)?;
        (result.best.clone(), Some(result))
    } else {
        (fit(data, &seed, &fit_opts)?, None)
    };

    let categories = categorize(data, &fitted.params);
    let (counts, unassigned) = category_counts(&categories, fitted.params.len());

    Ok(RunOutput {
        samples,
        seed,
        seed_origin,
        fit: fitted,
        search,
        categories,
        counts,
        unassigned,
    })
}

/// Resolve the EM seed: explicit flags win, otherwise ask the histogram.
pub fn initial_parameters(
    config: &FitConfig,
    data: &[f64],
) -> Result<(MixtureParameters, SeedOrigin), AppError> {
    let explicit = !(config.means.is_empty() && config.variances.is_empty() && config.weights.is_empty());
    if explicit {
        if config.means.is_empty() || config.variances.is_empty() {
            return Err(AppError::new(
                2,
                "Explicit seeds need both `--means` and `--variances` (`--weights` is optional).",
            ));
        }
        let weights = if config.weights.is_empty() {
            vec![1.0; config.means.len()]
        } else {
            config.weights.clone()
        };
        let params = MixtureParameters::new(config.means.clone(), config.variances.clone(), weights)?;
        return Ok((params, SeedOrigin::Explicit));
    }

    let histogram = Histogram::new(data)?;
    let min_gap = config.min_gap.unwrap_or_else(|| default_min_gap(histogram.num_bins()));
    let estimate = histogram.estimate_gmm(Some(min_gap))?;
    if estimate.is_empty() {
        warn!("Histogram estimate found no interval; seeding one component from sample moments.");
        return Ok((moments_seed(data)?, SeedOrigin::Moments));
    }

    info!(
        "Histogram estimate proposes {} component(s) over {} bins.",
        estimate.len(),
        histogram.num_bins()
    );
    Ok((
        estimate.into_parameters()?,
        SeedOrigin::Histogram {
            bins: histogram.num_bins(),
            min_gap,
        },
    ))
}

fn moments_seed(data: &[f64]) -> Result<MixtureParameters, GmmError> {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    MixtureParameters::new(vec![mean], vec![variance], vec![1.0])
}

/// Build the histogram listing and the estimator's proposal.
pub fn run_histogram(config: &HistogramConfig) -> Result<HistogramOutput, AppError> {
    let samples = load(&config.source)?;

    let mut histogram = Histogram::new(&samples.values)?;
    if config.low.is_some() || config.high.is_some() || config.bins.is_some() {
        histogram.recompute(config.low, config.high, config.bins)?;
    }

    let min_gap = config.min_gap.unwrap_or_else(|| default_min_gap(histogram.num_bins()));
    let estimate = histogram.estimate_gmm(Some(min_gap));

    Ok(HistogramOutput {
        samples,
        histogram,
        min_gap,
        estimate,
    })
}

/// Categorize samples with a saved model.
pub fn run_classify(config: &ClassifyConfig) -> Result<ClassifyOutput, AppError> {
    let model = read_model_json(&config.model)?;
    let params = model.parameters()?;
    let samples = load(&config.source)?;

    let categories = categorize(&samples.values, &params);
    let (counts, unassigned) = category_counts(&categories, params.len());
    let log_likelihood = log_likelihood_of(&samples.values, &params)
        .map_err(|e| warn!("Log-likelihood of classified samples unavailable: {e}"))
        .ok();

    Ok(ClassifyOutput {
        samples,
        model,
        params,
        categories,
        counts,
        unassigned,
        log_likelihood,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn demo_config() -> FitConfig {
        FitConfig {
            source: SampleSource::Demo {
                count: 10_000,
                seed: 2024,
            },
            means: Vec::new(),
            variances: Vec::new(),
            weights: Vec::new(),
            search: false,
            max_iterations: 100,
            tolerance: 1e-5,
            max_rounds: 100,
            min_gap: None,
            export_model: None,
            export_classes: None,
        }
    }

    #[test]
    fn explicit_seed_defaults_to_equal_weights() {
        let config = FitConfig {
            means: vec![1.0, 4.0],
            variances: vec![1.0, 4.0],
            ..demo_config()
        };
        let (seed, origin) = initial_parameters(&config, &[0.0, 1.0]).unwrap();
        assert_eq!(origin, SeedOrigin::Explicit);
        assert_abs_diff_eq!(seed.weights()[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn partial_explicit_seed_is_rejected() {
        let config = FitConfig {
            means: vec![1.0, 4.0],
            ..demo_config()
        };
        let err = initial_parameters(&config, &[0.0, 1.0]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn flat_data_falls_back_to_moments() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (seed, origin) = initial_parameters(&demo_config(), &data).unwrap();
        assert_eq!(origin, SeedOrigin::Moments);
        assert_eq!(seed.len(), 1);
        assert_abs_diff_eq!(seed.means()[0], 49.5, epsilon = 1e-12);
    }

    #[test]
    fn demo_fit_with_histogram_seed() {
        let run = run_fit(&demo_config()).unwrap();
        assert!(matches!(run.seed_origin, SeedOrigin::Histogram { .. }));
        assert!(run.search.is_none());
        assert_eq!(run.categories.len(), 10_000);
        assert_eq!(run.counts.iter().sum::<usize>() + run.unassigned, 10_000);
        assert_abs_diff_eq!(run.fit.params.weights().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn demo_search_never_loses_to_its_seed() {
        let config = FitConfig {
            means: vec![1.0, 4.0],
            variances: vec![1.0, 4.0],
            weights: vec![0.3, 0.7],
            search: true,
            max_rounds: 3,
            ..demo_config()
        };
        let run = run_fit(&config).unwrap();
        let direct = fit(
            &run.samples.values,
            &run.seed,
            &FitOptions::default(),
        )
        .unwrap();
        let search = run.search.as_ref().unwrap();
        assert!(search.rounds >= 1 && search.rounds <= 3);
        assert!(run.fit.log_likelihood >= direct.log_likelihood);
    }

    #[test]
    fn histogram_command_respects_overrides() {
        let config = HistogramConfig {
            source: SampleSource::Demo { count: 1_000, seed: 1 },
            low: Some(-2.0),
            high: Some(8.0),
            bins: Some(20),
            min_gap: None,
        };
        let out = run_histogram(&config).unwrap();
        assert_eq!(out.histogram.num_bins(), 20);
        assert_eq!(out.histogram.low(), -2.0);
        assert_eq!(out.min_gap, 1);
        assert!(out.histogram.total() <= 1_000);
    }
}
