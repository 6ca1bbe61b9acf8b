//! Cached Gaussian density evaluation.
//!
//! Each component's density is evaluated as
//!
//! ```text
//! f_k(x) = A_k * exp(B_k * (x - mean_k)^2)
//! A_k    = 1 / sqrt(2π variance_k)
//! B_k    = -1 / (2 variance_k)
//! ```
//!
//! `A` and `B` depend only on the variances, so they are refreshed once per EM
//! iteration (O(K)) and reused for every sample.

use std::f64::consts::PI;

use crate::domain::MixtureParameters;

/// Per-component normalization (`A`) and exponent (`B`) coefficients.
#[derive(Debug, Clone, Default)]
pub struct DensityCoefficients {
    a: Vec<f64>,
    b: Vec<f64>,
}

impl DensityCoefficients {
    pub fn new(params: &MixtureParameters) -> Self {
        let mut coeffs = Self::default();
        coeffs.refresh(params);
        coeffs
    }

    /// Recompute `A`/`B` from the current variances.
    ///
    /// Variances must be strictly positive.
    pub fn refresh(&mut self, params: &MixtureParameters) {
        let variances = params.variances();
        self.a.resize(variances.len(), 0.0);
        self.b.resize(variances.len(), 0.0);
        for (k, &v) in variances.iter().enumerate() {
            self.a[k] = 1.0 / (2.0 * PI * v).sqrt();
            self.b[k] = -1.0 / (2.0 * v);
        }
    }

    /// Density of component `k` (mean `mean`) at `x`.
    #[inline]
    pub fn density(&self, x: f64, mean: f64, k: usize) -> f64 {
        let d = x - mean;
        self.a[k] * (self.b[k] * d * d).exp()
    }

    /// Weighted density `w_k f_k(x)` for component `k` of `params`.
    #[inline]
    pub fn weighted(&self, params: &MixtureParameters, x: f64, k: usize) -> f64 {
        params.weights()[k] * self.density(x, params.means()[k], k)
    }

    /// Total mixture density `Σ_k w_k f_k(x)`.
    pub fn mixture(&self, params: &MixtureParameters, x: f64) -> f64 {
        (0..params.len()).map(|k| self.weighted(params, x, k)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn standard_normal_peak() {
        let p = MixtureParameters::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
        let c = DensityCoefficients::new(&p);
        assert_abs_diff_eq!(c.density(0.0, 0.0, 0), 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-12);
        // One sigma away: peak * exp(-1/2).
        assert_abs_diff_eq!(
            c.density(1.0, 0.0, 0),
            (-0.5_f64).exp() / (2.0 * PI).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn mixture_density_integrates_to_one() {
        let p = MixtureParameters::new(vec![-2.0, 3.0], vec![0.5, 4.0], vec![0.4, 0.6]).unwrap();
        let c = DensityCoefficients::new(&p);
        let (lo, hi, n) = (-20.0, 30.0, 50_000);
        let dx = (hi - lo) / n as f64;
        let area: f64 = (0..n).map(|i| c.mixture(&p, lo + (i as f64 + 0.5) * dx) * dx).sum();
        assert_abs_diff_eq!(area, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn refresh_follows_variance_changes() {
        let mut p = MixtureParameters::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
        let mut c = DensityCoefficients::new(&p);
        p.set_variance(0, 4.0);
        c.refresh(&p);
        assert_abs_diff_eq!(c.density(0.0, 0.0, 0), 1.0 / (8.0 * PI).sqrt(), epsilon = 1e-12);
    }
}
