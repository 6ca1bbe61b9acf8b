//! Multi-start search over EM local optima.
//!
//! Greedy hill climbing on top of [`fit`]:
//!
//! - round 1 fits the caller's seed
//! - every later round perturbs the best fit so far, one parameter per
//!   candidate, and fits all candidates in parallel
//! - the step size for each parameter is proportional to how far EM already
//!   moved it (`1.2 ×` the displacement for means, `1.2 ×` the ratio for
//!   variances)
//!
//! The search stops when a round brings no (relative) improvement, when a
//! generation is empty, or after `max_rounds`.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{FitResult, MixtureParameters};
use crate::error::GmmError;
use crate::fit::em::{fit, relative_change, validate_data, FitOptions};

/// Perturbation factor applied to how far a parameter moved.
const STEP_SCALE: f64 = 1.2;

/// Options for [`multiple_fits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of fit rounds.
    pub max_rounds: usize,
    /// Options for every EM run. `fit.tolerance` also gates round-to-round
    /// improvement.
    pub fit: FitOptions,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            fit: FitOptions::default(),
        }
    }
}

/// Best fit found by the search plus diagnostics.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best: FitResult,
    /// Rounds actually run.
    pub rounds: usize,
    pub candidates_evaluated: usize,
    pub candidates_failed: usize,
}

#[derive(Debug, Clone)]
struct Candidate<'a> {
    idx: usize,
    initial: &'a MixtureParameters,
    outcome: Result<FitResult, GmmError>,
}

/// Run the multi-start search from `initial`.
pub fn multiple_fits(
    data: &[f64],
    initial: &MixtureParameters,
    opts: &SearchOptions,
) -> Result<SearchResult, GmmError> {
    search_with(data, initial, opts, fit)
}

/// Round loop of [`multiple_fits`] with the per-candidate fit passed in.
fn search_with<F>(
    data: &[f64],
    initial: &MixtureParameters,
    opts: &SearchOptions,
    fit_one: F,
) -> Result<SearchResult, GmmError>
where
    F: Fn(&[f64], &MixtureParameters, &FitOptions) -> Result<FitResult, GmmError> + Sync,
{
    validate_data(data)?;
    opts.fit.validate()?;
    if opts.max_rounds == 0 {
        return Err(GmmError::InvalidInput("max_rounds must be >= 1.".to_string()));
    }

    let mut seeds = vec![initial.clone()];
    let mut running: Option<FitResult> = None;
    let mut rounds = 0;
    let mut evaluated = 0;
    let mut failed = 0;

    for round in 1..=opts.max_rounds {
        rounds = round;
        let candidates = fit_candidates(data, &seeds, &opts.fit, &fit_one);
        evaluated += candidates.len();
        let round_failed = candidates.iter().filter(|c| c.outcome.is_err()).count();
        failed += round_failed;
        for c in &candidates {
            if let Err(e) = &c.outcome {
                warn!("Round {round}: candidate {} failed: {e}", c.idx);
            }
        }

        let Some((best, best_fit)) = select_best(&candidates) else {
            if running.is_some() {
                warn!("Round {round}: all {} candidates failed; keeping last valid fit", candidates.len());
                break;
            }
            // Round 1 has exactly one candidate: surface its failure.
            return Err(candidates
                .iter()
                .find_map(|c| c.outcome.as_ref().err().cloned())
                .unwrap_or_else(|| GmmError::InvalidInput("No candidates to fit.".to_string())));
        };

        if let Some(current) = &running {
            let improved = best_fit.log_likelihood > current.log_likelihood
                && relative_change(current.log_likelihood, best_fit.log_likelihood)
                    >= opts.fit.tolerance;
            if !improved {
                info!(
                    "Round {round}: best log-likelihood {:.6} does not improve on {:.6}; stopping",
                    best_fit.log_likelihood, current.log_likelihood
                );
                break;
            }
        }

        info!(
            "Round {round}: {} candidates ({round_failed} failed), best #{} log-likelihood={:.6}",
            candidates.len(),
            best.idx,
            best_fit.log_likelihood
        );
        debug!(
            "Round {round}: means={:?} variances={:?} weights={:?}",
            best_fit.params.means(),
            best_fit.params.variances(),
            best_fit.params.weights()
        );

        let next = next_generation(best.initial, &best_fit.params);
        running = Some(best_fit.clone());
        drop(candidates);

        if next.is_empty() {
            info!("Round {round}: parameters stabilized; no new candidates");
            break;
        }
        seeds = next;
    }

    let best = running.ok_or_else(|| GmmError::InvalidInput("No valid fit produced.".to_string()))?;
    Ok(SearchResult {
        best,
        rounds,
        candidates_evaluated: evaluated,
        candidates_failed: failed,
    })
}

/// Fit every seed independently (parallel). Output order follows `seeds`.
fn fit_candidates<'a, F>(
    data: &[f64],
    seeds: &'a [MixtureParameters],
    opts: &FitOptions,
    fit_one: &F,
) -> Vec<Candidate<'a>>
where
    F: Fn(&[f64], &MixtureParameters, &FitOptions) -> Result<FitResult, GmmError> + Sync,
{
    seeds
        .par_iter()
        .enumerate()
        .map(|(idx, initial)| Candidate {
            idx,
            initial,
            outcome: fit_one(data, initial, opts),
        })
        .collect()
}

/// Deterministic selection: highest finite log-likelihood; ties go to the lower index.
fn select_best<'c, 'a>(candidates: &'c [Candidate<'a>]) -> Option<(&'c Candidate<'a>, &'c FitResult)> {
    let mut best: Option<(&Candidate<'a>, &FitResult)> = None;
    for c in candidates {
        let Ok(fit) = &c.outcome else {
            continue;
        };
        if !fit.log_likelihood.is_finite() {
            continue;
        }
        best = match best {
            Some((b, bf))
                if bf.log_likelihood > fit.log_likelihood
                    || (bf.log_likelihood == fit.log_likelihood && b.idx < c.idx) =>
            {
                Some((b, bf))
            }
            _ => Some((c, fit)),
        };
    }
    best
}

/// Perturb `fitted` one parameter at a time, scaled by how far EM moved it from `initial`.
///
/// Means first (`+δ`, `-δ`), then variances (`×r`, `÷r`), both by component index.
fn next_generation(initial: &MixtureParameters, fitted: &MixtureParameters) -> Vec<MixtureParameters> {
    let mut out = Vec::new();
    if initial.len() != fitted.len() {
        return out;
    }

    for k in 0..fitted.len() {
        let mean = fitted.means()[k];
        let delta = (mean - initial.means()[k]).abs() * STEP_SCALE;
        if delta > 0.0 {
            for shifted in [mean + delta, mean - delta] {
                if shifted.is_finite() {
                    let mut c = fitted.clone();
                    c.set_mean(k, shifted);
                    out.push(c);
                }
            }
        }
    }

    for k in 0..fitted.len() {
        let variance = fitted.variances()[k];
        if variance != initial.variances()[k] {
            let ratio = (variance / initial.variances()[k]).abs() * STEP_SCALE;
            for scaled in [variance * ratio, variance / ratio] {
                if scaled.is_finite() && scaled > 0.0 {
                    let mut c = fitted.clone();
                    c.set_variance(k, scaled);
                    out.push(c);
                }
            }
        }
    }

    out
}
