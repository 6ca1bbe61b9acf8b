//! Mixture-level evaluation shared by the EM engine and the classify command.

use crate::domain::MixtureParameters;
use crate::error::GmmError;
use crate::math::DensityCoefficients;

/// Total log-likelihood `Σ_i ln(Σ_k w_k f_k(x_i))`.
///
/// A sample with zero (underflowed) or non-finite mixture density makes the
/// total non-finite; that is reported instead of returned.
pub fn log_likelihood(
    data: &[f64],
    params: &MixtureParameters,
    coeffs: &DensityCoefficients,
) -> Result<f64, GmmError> {
    let mut total = 0.0;
    for &x in data {
        total += coeffs.mixture(params, x).ln();
    }
    if total.is_finite() {
        Ok(total)
    } else {
        Err(GmmError::NumericOverflow(format!(
            "log-likelihood evaluated to {total}"
        )))
    }
}

/// Convenience wrapper that builds fresh coefficients.
pub fn log_likelihood_of(data: &[f64], params: &MixtureParameters) -> Result<f64, GmmError> {
    log_likelihood(data, params, &DensityCoefficients::new(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_component_log_likelihood() {
        let p = MixtureParameters::new(vec![0.0], vec![1.0], vec![1.0]).unwrap();
        let ll = log_likelihood_of(&[0.0, 1.0], &p).unwrap();
        let expected = 2.0 * (-(0.5) * (2.0 * std::f64::consts::PI).ln()) - 0.5;
        assert_abs_diff_eq!(ll, expected, epsilon = 1e-12);
    }

    #[test]
    fn underflow_is_reported() {
        let p = MixtureParameters::new(vec![0.0], vec![0.01], vec![1.0]).unwrap();
        let err = log_likelihood_of(&[1e6], &p).unwrap_err();
        assert!(matches!(err, GmmError::NumericOverflow(_)));
    }
}
