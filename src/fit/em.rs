//! Expectation-Maximization for a one-dimensional Gaussian mixture.
//!
//! One call to [`fit`] runs the iterate-to-convergence loop for one set of
//! initial parameters:
//!
//! - E-step: total mixture density `p(x_i)` for every sample
//! - M-step: per component, responsibilities `γ_i = w_k f_k(x_i) / p(x_i)`
//!   and the weighted mean / variance / weight updates
//!
//! This is batch EM: every component's responsibilities come from the
//! parameters at the start of the iteration, even though components are
//! written back one after another.
//!
//! Stopping rules, in order: a log-likelihood regression (rolled back), a
//! relative change below the tolerance, the iteration cap.

use log::{debug, trace};

use crate::domain::{FitResult, MixtureParameters, StopReason};
use crate::error::GmmError;
use crate::math::DensityCoefficients;
use crate::models::log_likelihood;

/// Options for a single EM run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Hard cap on EM iterations.
    pub max_iterations: usize,
    /// Stop once `|ΔLL / LL|` drops below this value.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-5,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), GmmError> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(GmmError::InvalidInput(format!(
                "Tolerance must be finite and >= 0 (got {}).",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Scratch buffers owned by one EM run.
struct Workspace {
    total_p: Vec<f64>,
    gamma: Vec<f64>,
    coeffs: DensityCoefficients,
}

impl Workspace {
    fn new(n: usize, params: &MixtureParameters) -> Self {
        Self {
            total_p: vec![0.0; n],
            gamma: vec![0.0; n],
            coeffs: DensityCoefficients::new(params),
        }
    }
}

/// Fit the mixture to `data` starting from `initial`.
///
/// `initial` is never modified; the run works on its own copy.
pub fn fit(
    data: &[f64],
    initial: &MixtureParameters,
    opts: &FitOptions,
) -> Result<FitResult, GmmError> {
    validate_data(data)?;
    opts.validate()?;

    let mut ws = Workspace::new(data.len(), initial);
    let mut current = initial.clone();
    let mut ll = log_likelihood(data, &current, &ws.coeffs)?;
    debug!(
        "EM start: k={} n={} log-likelihood={ll:.6}",
        current.len(),
        data.len()
    );

    let mut iterations = 0;
    let mut stop = StopReason::MaxIterations;

    for iteration in 1..=opts.max_iterations {
        let previous = current.clone();

        em_step(data, &mut current, &mut ws, iteration)?;
        ws.coeffs.refresh(&current);
        let new_ll = log_likelihood(data, &current, &ws.coeffs)?;
        trace!("EM iteration {iteration}: means={:?} variances={:?}", current.means(), current.variances());
        debug!("EM iteration {iteration}: log-likelihood={new_ll:.6}");

        if new_ll < ll {
            debug!("EM iteration {iteration} lowered log-likelihood ({ll:.6} -> {new_ll:.6}); rolling back");
            current = previous;
            stop = StopReason::Regressed;
            break;
        }

        iterations = iteration;
        let change = relative_change(ll, new_ll);
        ll = new_ll;
        if change < opts.tolerance {
            stop = StopReason::Converged;
            break;
        }
    }

    debug!("EM stop after {iterations} iterations ({}): log-likelihood={ll:.6}", stop.display_name());

    Ok(FitResult {
        params: current,
        log_likelihood: ll,
        iterations,
        stop,
    })
}

/// One E-step plus sequential per-component M-steps, in place.
fn em_step(
    data: &[f64],
    params: &mut MixtureParameters,
    ws: &mut Workspace,
    iteration: usize,
) -> Result<(), GmmError> {
    for (i, &x) in data.iter().enumerate() {
        let p = ws.coeffs.mixture(params, x);
        if !(p > 0.0 && p.is_finite()) {
            return Err(GmmError::NumericOverflow(format!(
                "mixture density at sample {i} (x={x}) is {p} in iteration {iteration}"
            )));
        }
        ws.total_p[i] = p;
    }

    let n = data.len() as f64;
    for k in 0..params.len() {
        // Component k's own parameters have not been written yet this
        // iteration, and `coeffs` still holds the start-of-iteration A/B.
        let mean_k = params.means()[k];
        let weight_k = params.weights()[k];
        for (i, &x) in data.iter().enumerate() {
            ws.gamma[i] = weight_k * ws.coeffs.density(x, mean_k, k) / ws.total_p[i];
        }

        let n_k: f64 = ws.gamma.iter().sum();
        if !(n_k > 0.0 && n_k.is_finite()) {
            return Err(GmmError::DegenerateComponent {
                component: k,
                iteration,
                reason: format!("effective sample weight collapsed to {n_k}"),
            });
        }

        let mean = ws.gamma.iter().zip(data).map(|(g, x)| g * x).sum::<f64>() / n_k;
        let variance = ws
            .gamma
            .iter()
            .zip(data)
            .map(|(g, x)| g * (x - mean) * (x - mean))
            .sum::<f64>()
            / n_k;
        if !(variance > 0.0 && variance.is_finite() && mean.is_finite()) {
            return Err(GmmError::DegenerateComponent {
                component: k,
                iteration,
                reason: format!("variance collapsed to {variance}"),
            });
        }

        params.set_component(k, mean, variance, n_k / n);
    }

    params.normalize_weights();
    Ok(())
}

/// `|Δ / previous|`, falling back to the absolute change when `previous == 0`.
pub(crate) fn relative_change(previous: f64, current: f64) -> f64 {
    let delta = (current - previous).abs();
    if previous == 0.0 {
        delta
    } else {
        (delta / previous).abs()
    }
}

pub(crate) fn validate_data(data: &[f64]) -> Result<(), GmmError> {
    if data.is_empty() {
        return Err(GmmError::InvalidInput("No data points to fit.".to_string()));
    }
    if let Some(i) = data.iter().position(|x| !x.is_finite()) {
        return Err(GmmError::InvalidInput(format!(
            "Sample {i} is not finite ({}).",
            data[i]
        )));
    }
    Ok(())
}
