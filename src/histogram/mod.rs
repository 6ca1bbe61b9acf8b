//! Fixed-width histogram over one-dimensional samples.
//!
//! Bins are half-open `[lo, hi)` except the last one, which also takes
//! samples exactly equal to `high`. Samples outside `[low, high]` are dropped,
//! so `Σ counts <= n`.
//!
//! The histogram keeps its own copy of the samples so it can be rebinned with
//! a different range or bin count (`recompute`).

pub mod estimate;

pub use estimate::*;

use crate::error::GmmError;

/// Bin count limits for the default `sqrt(n)` rule.
const MIN_DEFAULT_BINS: usize = 3;
const MAX_DEFAULT_BINS: usize = 101;

#[derive(Debug, Clone)]
pub struct Histogram {
    data: Vec<f64>,
    low: f64,
    high: f64,
    counts: Vec<usize>,
}

impl Histogram {
    /// Histogram over the observed range with the default bin count.
    pub fn new(data: &[f64]) -> Result<Self, GmmError> {
        validate_samples(data)?;
        let (low, high) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        Self::with_range(data, low, high, default_bin_count(data.len()))
    }

    /// Histogram with an explicit range and bin count.
    pub fn with_range(data: &[f64], low: f64, high: f64, num_bins: usize) -> Result<Self, GmmError> {
        validate_samples(data)?;
        validate_layout(low, high, num_bins)?;
        let mut hist = Self {
            data: data.to_vec(),
            low,
            high,
            counts: vec![0; num_bins],
        };
        hist.fill();
        Ok(hist)
    }

    /// Rebin with any subset of range / bin count changed. Unspecified values
    /// keep their current setting.
    pub fn recompute(
        &mut self,
        low: Option<f64>,
        high: Option<f64>,
        num_bins: Option<usize>,
    ) -> Result<(), GmmError> {
        let low = low.unwrap_or(self.low);
        let high = high.unwrap_or(self.high);
        let num_bins = num_bins.unwrap_or(self.counts.len());
        validate_layout(low, high, num_bins)?;

        self.low = low;
        self.high = high;
        self.counts = vec![0; num_bins];
        self.fill();
        Ok(())
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.counts.len() as f64
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn count(&self, bin: usize) -> usize {
        self.counts[bin]
    }

    /// Number of samples that landed in a bin.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of samples the histogram was built from (binned or not).
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.low + (bin as f64 + 0.5) * self.bin_width()
    }

    /// `(lower, upper)` edges of a bin.
    pub fn bin_edges(&self, bin: usize) -> (f64, f64) {
        let w = self.bin_width();
        (self.low + bin as f64 * w, self.low + (bin as f64 + 1.0) * w)
    }

    /// Bin index for `x`, or `None` when `x` is outside `[low, high]`.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if !(x >= self.low && x <= self.high) {
            return None;
        }
        let last = self.counts.len() - 1;
        if x == self.high {
            return Some(last);
        }
        let bin = ((x - self.low) / self.bin_width()) as usize;
        // Rounding can push a value just below `high` onto `num_bins`.
        Some(bin.min(last))
    }

    fn fill(&mut self) {
        for i in 0..self.data.len() {
            if let Some(bin) = self.bin_index(self.data[i]) {
                self.counts[bin] += 1;
            }
        }
    }
}

/// `clamp(round(sqrt(n)), 3, 101)`, bumped to the next odd number.
pub fn default_bin_count(n: usize) -> usize {
    let bins = ((n as f64).sqrt().round() as usize).clamp(MIN_DEFAULT_BINS, MAX_DEFAULT_BINS);
    if bins % 2 == 0 { bins + 1 } else { bins }
}

fn validate_samples(data: &[f64]) -> Result<(), GmmError> {
    if data.is_empty() {
        return Err(GmmError::InvalidInput(
            "Cannot build a histogram from no samples.".to_string(),
        ));
    }
    if let Some(i) = data.iter().position(|x| !x.is_finite()) {
        return Err(GmmError::InvalidInput(format!(
            "Sample {i} is not finite ({}).",
            data[i]
        )));
    }
    Ok(())
}

fn validate_layout(low: f64, high: f64, num_bins: usize) -> Result<(), GmmError> {
    if !(low.is_finite() && high.is_finite() && high >= low) {
        return Err(GmmError::InvalidInput(format!(
            "Invalid histogram range: low={low}, high={high} (must be finite and high >= low)."
        )));
    }
    if num_bins == 0 {
        return Err(GmmError::InvalidInput(
            "Histogram needs at least one bin.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_bin_count_rule() {
        assert_eq!(default_bin_count(1), 3);
        assert_eq!(default_bin_count(4), 3);
        assert_eq!(default_bin_count(16), 5);
        assert_eq!(default_bin_count(50), 7);
        assert_eq!(default_bin_count(10_000), 101);
        assert_eq!(default_bin_count(1_000_000), 101);
    }

    #[test]
    fn default_range_covers_all_samples() {
        let data = [3.0, -1.0, 2.0, 7.0, 0.5];
        let h = Histogram::new(&data).unwrap();
        assert_eq!(h.low(), -1.0);
        assert_eq!(h.high(), 7.0);
        assert_eq!(h.num_bins(), 3);
        assert_eq!(h.total(), data.len());
    }

    #[test]
    fn high_edge_goes_to_last_bin() {
        let h = Histogram::with_range(&[0.0, 1.0, 2.0, 4.0], 0.0, 4.0, 4).unwrap();
        assert_eq!(h.counts(), &[1, 1, 1, 1]);
        assert_eq!(h.bin_index(4.0), Some(3));
        assert_eq!(h.bin_index(3.999), Some(3));
    }

    #[test]
    fn out_of_range_samples_are_dropped() {
        let data = [-5.0, 0.0, 0.5, 1.0, 9.0];
        let h = Histogram::with_range(&data, 0.0, 1.0, 2).unwrap();
        assert_eq!(h.counts(), &[1, 2]);
        assert_eq!(h.total(), 3);
        assert!(h.total() <= h.sample_count());
        assert_eq!(h.bin_index(-5.0), None);
        assert_eq!(h.bin_index(1.0000001), None);
    }

    #[test]
    fn recompute_keeps_unspecified_settings() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let mut h = Histogram::with_range(&data, 0.0, 99.0, 9).unwrap();
        assert_eq!(h.total(), 100);

        h.recompute(None, None, Some(3)).unwrap();
        assert_eq!(h.num_bins(), 3);
        assert_eq!(h.low(), 0.0);
        assert_eq!(h.high(), 99.0);
        assert_eq!(h.total(), 100);

        h.recompute(Some(50.0), None, None).unwrap();
        assert_eq!(h.num_bins(), 3);
        assert_eq!(h.total(), 50);

        assert!(h.recompute(Some(100.0), Some(0.0), None).is_err());
        assert!(h.recompute(None, None, Some(0)).is_err());
        // A failed rebin leaves the previous layout intact.
        assert_eq!(h.low(), 50.0);
        assert_eq!(h.num_bins(), 3);
    }

    #[test]
    fn bin_geometry() {
        let h = Histogram::with_range(&[0.0], 0.0, 10.0, 5).unwrap();
        assert_abs_diff_eq!(h.bin_width(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h.bin_center(0), 1.0, epsilon = 1e-12);
        let (lo, hi) = h.bin_edges(4);
        assert_abs_diff_eq!(lo, 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hi, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_samples_land_in_last_bin() {
        let h = Histogram::new(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(h.low(), h.high());
        assert_eq!(h.counts(), &[0, 0, 3]);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(Histogram::new(&[]).is_err());
        assert!(Histogram::new(&[1.0, f64::INFINITY]).is_err());
        assert!(Histogram::with_range(&[1.0], 2.0, 1.0, 3).is_err());
        assert!(Histogram::with_range(&[1.0], 0.0, 1.0, 0).is_err());
    }
}
