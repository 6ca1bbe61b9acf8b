//! Hard assignment of samples to fitted components.
//!
//! A sample is `Unassigned` when it lies outside `mean_k ± 3σ_k` of every
//! component. Otherwise it goes to `argmax_k w_k f_k(x)` and reports that
//! component's share of the total mixture density (over all components, not
//! only those whose envelope contains the sample).

use crate::domain::{Category, MixtureParameters};
use crate::math::DensityCoefficients;

/// Half-width of the acceptance envelope, in standard deviations.
const ENVELOPE_SIGMAS: f64 = 3.0;

/// Label every sample. Pure function of its inputs.
pub fn categorize(data: &[f64], params: &MixtureParameters) -> Vec<Category> {
    let coeffs = DensityCoefficients::new(params);
    let k_len = params.len();
    let half_widths: Vec<f64> = (0..k_len)
        .map(|k| ENVELOPE_SIGMAS * params.std_dev(k))
        .collect();

    data.iter()
        .map(|&x| {
            let inside = (0..k_len).any(|k| (x - params.means()[k]).abs() <= half_widths[k]);
            if !inside {
                return Category::Unassigned;
            }

            let mut total = 0.0;
            let mut best_k = 0;
            let mut best_p = f64::NEG_INFINITY;
            for k in 0..k_len {
                let p = coeffs.weighted(params, x, k);
                total += p;
                if p > best_p {
                    best_p = p;
                    best_k = k;
                }
            }

            if !(total > 0.0 && total.is_finite()) {
                return Category::Unassigned;
            }
            Category::Assigned {
                component: best_k,
                probability: best_p / total,
            }
        })
        .collect()
}

/// Per-component label counts plus the unassigned count.
pub fn category_counts(categories: &[Category], components: usize) -> (Vec<usize>, usize) {
    let mut counts = vec![0usize; components];
    let mut unassigned = 0usize;
    for c in categories {
        match c.component() {
            Some(k) if k < components => counts[k] += 1,
            _ => unassigned += 1,
        }
    }
    (counts, unassigned)
}
