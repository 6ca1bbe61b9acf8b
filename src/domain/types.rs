//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - mutated in place by a single EM run (parameters are cloned per fit)
//! - exported to JSON/CSV
//! - reloaded later for classification

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GmmError;

/// One mixture component as a plain value record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub mean: f64,
    pub variance: f64,
    pub weight: f64,
}

/// Parameters of a one-dimensional Gaussian mixture.
///
/// Stored as parallel arrays. Invariants, checked on construction and
/// maintained by the EM engine:
///
/// - at least one component, all arrays the same length
/// - every variance finite and `> 0`
/// - every weight finite and `> 0`, weights summing to 1
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParameters {
    means: Vec<f64>,
    variances: Vec<f64>,
    weights: Vec<f64>,
}

impl MixtureParameters {
    /// Build from parallel arrays. Weights are renormalized to sum to 1.
    pub fn new(means: Vec<f64>, variances: Vec<f64>, weights: Vec<f64>) -> Result<Self, GmmError> {
        if means.is_empty() {
            return Err(GmmError::InvalidInput(
                "Mixture must have at least one component.".to_string(),
            ));
        }
        if variances.len() != means.len() || weights.len() != means.len() {
            return Err(GmmError::InvalidInput(format!(
                "Parameter length mismatch: means={}, variances={}, weights={}.",
                means.len(),
                variances.len(),
                weights.len()
            )));
        }
        if let Some(k) = means.iter().position(|m| !m.is_finite()) {
            return Err(GmmError::InvalidInput(format!(
                "Mean of component {k} is not finite."
            )));
        }
        if let Some(k) = variances.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(GmmError::InvalidInput(format!(
                "Variance of component {k} must be finite and > 0 (got {}).",
                variances[k]
            )));
        }
        if let Some(k) = weights.iter().position(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(GmmError::InvalidInput(format!(
                "Weight of component {k} must be finite and > 0 (got {}).",
                weights[k]
            )));
        }

        let mut params = Self {
            means,
            variances,
            weights,
        };
        params.normalize_weights();
        Ok(params)
    }

    /// Build from component records.
    pub fn from_components(components: &[Component]) -> Result<Self, GmmError> {
        Self::new(
            components.iter().map(|c| c.mean).collect(),
            components.iter().map(|c| c.variance).collect(),
            components.iter().map(|c| c.weight).collect(),
        )
    }

    /// Number of components (K).
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn component(&self, k: usize) -> Component {
        Component {
            mean: self.means[k],
            variance: self.variances[k],
            weight: self.weights[k],
        }
    }

    pub fn components(&self) -> Vec<Component> {
        (0..self.len()).map(|k| self.component(k)).collect()
    }

    /// Standard deviation of component `k`.
    pub fn std_dev(&self, k: usize) -> f64 {
        self.variances[k].sqrt()
    }

    pub(crate) fn set_component(&mut self, k: usize, mean: f64, variance: f64, weight: f64) {
        self.means[k] = mean;
        self.variances[k] = variance;
        self.weights[k] = weight;
    }

    pub(crate) fn set_mean(&mut self, k: usize, mean: f64) {
        self.means[k] = mean;
    }

    pub(crate) fn set_variance(&mut self, k: usize, variance: f64) {
        self.variances[k] = variance;
    }

    /// Rescale weights so they sum to 1.
    pub(crate) fn normalize_weights(&mut self) {
        let total: f64 = self.weights.iter().sum();
        if total > 0.0 && total.is_finite() {
            for w in &mut self.weights {
                *w /= total;
            }
        }
    }
}

/// Why an EM run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Relative log-likelihood change fell below the tolerance.
    Converged,
    /// The last iteration lowered the log-likelihood and was rolled back.
    Regressed,
    /// Iteration cap reached.
    MaxIterations,
}

impl StopReason {
    pub fn display_name(self) -> &'static str {
        match self {
            StopReason::Converged => "converged",
            StopReason::Regressed => "rolled back (regression)",
            StopReason::MaxIterations => "iteration cap",
        }
    }
}

/// Output of a single EM run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub params: MixtureParameters,
    pub log_likelihood: f64,
    /// Accepted iterations (a rolled-back iteration is not counted).
    pub iterations: usize,
    pub stop: StopReason,
}

/// Classification of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Category {
    /// Most likely component and its posterior share.
    Assigned { component: usize, probability: f64 },
    /// Outside the 3-sigma envelope of every component.
    Unassigned,
}

impl Category {
    pub fn component(&self) -> Option<usize> {
        match self {
            Category::Assigned { component, .. } => Some(*component),
            Category::Unassigned => None,
        }
    }
}

/// Where the `fit` / `histogram` / `classify` commands get their samples from.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleSource {
    /// A CSV file; `column` selects a header name (first column when `None`).
    Csv { path: PathBuf, column: Option<String> },
    /// Synthetic two-cluster demo data: 30% N(1, 1) and 70% N(4, 2²).
    Demo { count: usize, seed: u64 },
}

/// A full `gmm fit` run configuration, derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub source: SampleSource,

    /// Explicit seed parameters. When all are empty the histogram estimator
    /// proposes the seed.
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    pub weights: Vec<f64>,

    /// Run the multi-start search instead of a single EM fit.
    pub search: bool,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub max_rounds: usize,
    /// Bin gap for the histogram estimator (default: 5% of bins).
    pub min_gap: Option<usize>,

    pub export_model: Option<PathBuf>,
    pub export_classes: Option<PathBuf>,
}

/// Configuration for `gmm histogram`.
#[derive(Debug, Clone)]
pub struct HistogramConfig {
    pub source: SampleSource,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub bins: Option<usize>,
    pub min_gap: Option<usize>,
}

/// Configuration for `gmm classify`.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub source: SampleSource,
    pub model: PathBuf,
    pub export_classes: Option<PathBuf>,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub n_samples: usize,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub stop: StopReason,
    pub components: Vec<Component>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn new_renormalizes_weights() {
        let p = MixtureParameters::new(vec![0.0, 5.0], vec![1.0, 2.0], vec![1.0, 3.0]).unwrap();
        assert_abs_diff_eq!(p.weights()[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(p.weights()[1], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(p.weights().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn new_rejects_bad_inputs() {
        assert!(matches!(
            MixtureParameters::new(vec![0.0, 1.0], vec![1.0], vec![0.5, 0.5]),
            Err(GmmError::InvalidInput(_))
        ));
        assert!(matches!(
            MixtureParameters::new(vec![0.0], vec![0.0], vec![1.0]),
            Err(GmmError::InvalidInput(_))
        ));
        assert!(matches!(
            MixtureParameters::new(vec![0.0], vec![-1.0], vec![1.0]),
            Err(GmmError::InvalidInput(_))
        ));
        assert!(matches!(
            MixtureParameters::new(vec![], vec![], vec![]),
            Err(GmmError::InvalidInput(_))
        ));
        assert!(matches!(
            MixtureParameters::new(vec![f64::NAN], vec![1.0], vec![1.0]),
            Err(GmmError::InvalidInput(_))
        ));
    }

    #[test]
    fn components_round_trip_through_records() {
        let p = MixtureParameters::new(vec![1.0, 4.0], vec![1.0, 4.0], vec![0.3, 0.7]).unwrap();
        let q = MixtureParameters::from_components(&p.components()).unwrap();
        assert_eq!(p, q);
        assert_eq!(p.component(1).mean, 4.0);
        assert_abs_diff_eq!(p.std_dev(1), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn category_component_accessor() {
        let a = Category::Assigned {
            component: 2,
            probability: 0.9,
        };
        assert_eq!(a.component(), Some(2));
        assert_eq!(Category::Unassigned.component(), None);
    }
}
