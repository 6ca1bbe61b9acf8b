//! Synthetic mixture sampling.
//!
//! Used by the demo command and by tests to produce reproducible data with a
//! known generating mixture.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

/// A weighted set of normal random variables.
///
/// Likelihoods do not need to sum to 1; they are normalized by the sampler.
#[derive(Debug, Clone)]
pub struct MixtureSampler {
    normals: Vec<Normal<f64>>,
    index: WeightedIndex<f64>,
}

impl MixtureSampler {
    /// Build from `(mean, std_dev, likelihood)` triples.
    pub fn new(clusters: &[(f64, f64, f64)]) -> Result<Self, AppError> {
        if clusters.is_empty() {
            return Err(AppError::new(2, "Sampler needs at least one component."));
        }
        let normals = clusters
            .iter()
            .map(|&(mean, sd, _)| {
                // `Normal::new` accepts any finite std-dev, including negative ones.
                if !(sd > 0.0 && sd.is_finite()) {
                    return Err(AppError::new(
                        2,
                        format!("Invalid normal N({mean}, {sd}): std-dev must be finite and > 0"),
                    ));
                }
                Normal::new(mean, sd).map_err(|e| {
                    AppError::new(2, format!("Invalid normal N({mean}, {sd}): {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let index = WeightedIndex::new(clusters.iter().map(|&(_, _, w)| w))
            .map_err(|e| AppError::new(2, format!("Invalid component likelihoods: {e}")))?;
        Ok(Self { normals, index })
    }

    /// The two-cluster demo mixture: 30% N(1, 1) and 70% N(4, 2²).
    pub fn demo() -> Result<Self, AppError> {
        Self::new(&[(1.0, 1.0, 0.3), (4.0, 2.0, 0.7)])
    }

    /// Draw `count` samples from a generator seeded with `seed`.
    pub fn sample(&self, count: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let k = self.index.sample(&mut rng);
                self.normals[k].sample(&mut rng)
            })
            .collect()
    }
}

/// Generate demo data (see [`MixtureSampler::demo`]).
pub fn generate_demo(count: usize, seed: u64) -> Result<Vec<f64>, AppError> {
    if count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    Ok(MixtureSampler::demo()?.sample(count, seed))
}
