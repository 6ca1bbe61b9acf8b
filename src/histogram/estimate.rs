//! Histogram-driven proposal of initial mixture parameters.
//!
//! Bins are swept from the tallest height downwards and grouped into
//! intervals; each interval becomes one proposed component. The sweep stops
//! once the current height is no longer clearly above the average of what is
//! left (`height < 2 * avg_remaining`).

use log::debug;

use super::Histogram;
use crate::domain::MixtureParameters;
use crate::error::GmmError;

/// Fraction of the bin count used as the default neighbor reach.
const DEFAULT_GAP_FRACTION: f64 = 0.05;

/// A proposed mixture, ordered by mean.
#[derive(Debug, Clone, PartialEq)]
pub struct GmmEstimate {
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GmmEstimate {
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Validated mixture parameters for seeding EM.
    pub fn into_parameters(self) -> Result<MixtureParameters, GmmError> {
        MixtureParameters::new(self.means, self.variances, self.weights)
    }
}

impl TryFrom<GmmEstimate> for MixtureParameters {
    type Error = GmmError;

    fn try_from(estimate: GmmEstimate) -> Result<Self, Self::Error> {
        estimate.into_parameters()
    }
}

/// `max(1, floor(0.05 * num_bins))`.
pub fn default_min_gap(num_bins: usize) -> usize {
    ((num_bins as f64 * DEFAULT_GAP_FRACTION) as usize).max(1)
}

impl Histogram {
    /// Propose a mixture from the bin heights.
    ///
    /// `min_gap` is how many bins an unassigned bin may look past on each side
    /// to find an interval to join (default: [`default_min_gap`]).
    pub fn estimate_gmm(&self, min_gap: Option<usize>) -> Result<GmmEstimate, GmmError> {
        if self.total() == 0 {
            return Err(GmmError::InvalidInput(
                "Cannot estimate a mixture from an empty histogram.".to_string(),
            ));
        }
        let width = self.bin_width();
        if !(width > 0.0) {
            return Err(GmmError::InvalidInput(format!(
                "Cannot estimate a mixture from a zero-width histogram range ({} to {}).",
                self.low(),
                self.high()
            )));
        }
        let min_gap = match min_gap {
            Some(0) => {
                return Err(GmmError::InvalidInput("min_gap must be >= 1.".to_string()));
            }
            Some(g) => g,
            None => default_min_gap(self.num_bins()),
        };

        let ids = assign_intervals(self.counts(), min_gap);
        let estimate = summarize_intervals(self, &ids, width * width / 12.0);
        debug!(
            "Histogram estimate: {} interval(s) from {} bins (min_gap={min_gap}).",
            estimate.len(),
            self.num_bins()
        );
        Ok(estimate)
    }
}

/// Interval id per bin (`None` = never assigned).
fn assign_intervals(counts: &[usize], min_gap: usize) -> Vec<Option<usize>> {
    let n = counts.len();
    let mut ids: Vec<Option<usize>> = vec![None; n];
    let mut next_id = 0usize;
    let mut values_left: usize = counts.iter().sum();
    let mut bins_left = n;

    let mut heights: Vec<usize> = counts.iter().copied().filter(|&c| c > 0).collect();
    heights.sort_unstable_by(|a, b| b.cmp(a));
    heights.dedup();

    for height in heights {
        if bins_left == 0 {
            break;
        }
        let avg_remaining = values_left as f64 / bins_left as f64;
        if (height as f64) < 2.0 * avg_remaining {
            break;
        }

        for bin in 0..n {
            if counts[bin] != height || ids[bin].is_some() {
                continue;
            }

            let left = nearest_assigned(&ids, bin, min_gap, Direction::Left);
            let right = nearest_assigned(&ids, bin, min_gap, Direction::Right);

            let id = match (left, right) {
                (None, None) => {
                    next_id += 1;
                    next_id - 1
                }
                (Some((_, l)), None) => l,
                (None, Some((_, r))) => r,
                (Some((_, l)), Some((_, r))) => {
                    let (keep, merged) = if l <= r { (l, r) } else { (r, l) };
                    if keep != merged {
                        for slot in ids.iter_mut().filter(|slot| **slot == Some(merged)) {
                            *slot = Some(keep);
                        }
                    }
                    keep
                }
            };

            let from = left.map_or(bin, |(b, _)| b + 1);
            let to = right.map_or(bin, |(b, _)| b - 1);
            for j in from..=to {
                if ids[j].is_none() {
                    ids[j] = Some(id);
                    values_left -= counts[j];
                    bins_left -= 1;
                }
            }
        }
    }

    ids
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Left,
    Right,
}

/// Closest assigned bin within `reach` of `bin` on one side: `(bin, id)`.
fn nearest_assigned(
    ids: &[Option<usize>],
    bin: usize,
    reach: usize,
    direction: Direction,
) -> Option<(usize, usize)> {
    (1..=reach).find_map(|d| {
        let j = match direction {
            Direction::Left => bin.checked_sub(d)?,
            Direction::Right => Some(bin + d).filter(|&j| j < ids.len())?,
        };
        ids[j].map(|id| (j, id))
    })
}

fn summarize_intervals(hist: &Histogram, ids: &[Option<usize>], variance_floor: f64) -> GmmEstimate {
    let mut labels: Vec<usize> = ids.iter().flatten().copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let total = hist.total() as f64;
    let mut intervals: Vec<(f64, f64, f64)> = labels
        .iter()
        .filter_map(|&label| {
            let members: Vec<usize> = (0..ids.len()).filter(|&i| ids[i] == Some(label)).collect();
            let count: usize = members.iter().map(|&i| hist.count(i)).sum();
            if count == 0 {
                return None;
            }
            let c = count as f64;
            let mean = members
                .iter()
                .map(|&i| hist.count(i) as f64 * hist.bin_center(i))
                .sum::<f64>()
                / c;
            let variance = members
                .iter()
                .map(|&i| {
                    let d = hist.bin_center(i) - mean;
                    hist.count(i) as f64 * d * d
                })
                .sum::<f64>()
                / c;
            Some((mean, variance.max(variance_floor), c / total))
        })
        .collect();

    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let weight_sum: f64 = intervals.iter().map(|iv| iv.2).sum();
    GmmEstimate {
        means: intervals.iter().map(|iv| iv.0).collect(),
        variances: intervals.iter().map(|iv| iv.1).collect(),
        weights: intervals.iter().map(|iv| iv.2 / weight_sum).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_demo;
    use approx::assert_abs_diff_eq;

    /// Histogram over `[0, counts.len())` with unit-width bins and exactly the
    /// given counts.
    fn from_counts(counts: &[usize]) -> Histogram {
        let data: Vec<f64> = counts
            .iter()
            .enumerate()
            .flat_map(|(i, &c)| std::iter::repeat(i as f64 + 0.5).take(c))
            .collect();
        let hist = Histogram::with_range(&data, 0.0, counts.len() as f64, counts.len()).unwrap();
        assert_eq!(hist.counts(), counts);
        hist
    }

    #[test]
    fn default_min_gap_rule() {
        assert_eq!(default_min_gap(3), 1);
        assert_eq!(default_min_gap(21), 1);
        assert_eq!(default_min_gap(40), 2);
        assert_eq!(default_min_gap(101), 5);
    }

    #[test]
    fn bimodal_pattern_gives_two_intervals() {
        let hist = from_counts(&[
            0, 1, 3, 8, 15, 8, 3, 1, 0, 0, 0, 0, 1, 2, 6, 12, 6, 2, 1, 0, 0,
        ]);
        let est = hist.estimate_gmm(None).unwrap();

        assert_eq!(est.len(), 2);
        assert_abs_diff_eq!(est.means[0], 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(est.means[1], 15.5, epsilon = 1e-12);
        assert_abs_diff_eq!(est.weights[0], 39.0 / 69.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.weights[1], 30.0 / 69.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(est.variances.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn min_gap_bridges_nearby_peaks() {
        let mut counts = vec![0usize; 21];
        counts[5] = 10;
        counts[7] = 10;
        let hist = from_counts(&counts);

        let narrow = hist.estimate_gmm(Some(1)).unwrap();
        assert_eq!(narrow.len(), 2);
        assert_abs_diff_eq!(narrow.means[0], 5.5, epsilon = 1e-12);
        assert_abs_diff_eq!(narrow.means[1], 7.5, epsilon = 1e-12);
        // Single-bin intervals fall back to the bin-width floor.
        assert_abs_diff_eq!(narrow.variances[0], 1.0 / 12.0, epsilon = 1e-12);

        let wide = hist.estimate_gmm(Some(2)).unwrap();
        assert_eq!(wide.len(), 1);
        assert_abs_diff_eq!(wide.means[0], 6.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wide.variances[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wide.weights[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn bin_between_two_intervals_merges_them() {
        let mut counts = vec![0usize; 13];
        counts[4] = 10;
        counts[6] = 5;
        counts[8] = 10;
        let hist = from_counts(&counts);

        let est = hist.estimate_gmm(Some(2)).unwrap();
        assert_eq!(est.len(), 1);
        assert_abs_diff_eq!(est.means[0], 6.5, epsilon = 1e-12);
    }

    #[test]
    fn intervals_are_ordered_by_mean() {
        // The right peak is taller, so it gets the first id.
        let mut counts = vec![0usize; 21];
        counts[3] = 5;
        counts[15] = 20;
        let est = from_counts(&counts).estimate_gmm(None).unwrap();
        assert_eq!(est.len(), 2);
        assert!(est.means[0] < est.means[1]);
        assert_abs_diff_eq!(est.weights[0], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn flat_histogram_stops_early() {
        // Every height equals the average, so no bin clears 2x the average.
        let est = from_counts(&[4, 4, 4, 4, 4]).estimate_gmm(None).unwrap();
        assert!(est.is_empty());
        assert!(est.into_parameters().is_err());
    }

    #[test]
    fn rejects_empty_or_degenerate_histograms() {
        let hist = Histogram::with_range(&[10.0, 11.0], 0.0, 5.0, 5).unwrap();
        assert_eq!(hist.total(), 0);
        assert!(matches!(
            hist.estimate_gmm(None),
            Err(GmmError::InvalidInput(_))
        ));

        let constant = Histogram::new(&[2.0, 2.0, 2.0]).unwrap();
        assert!(constant.estimate_gmm(None).is_err());

        let ok = from_counts(&[0, 5, 0]);
        assert!(ok.estimate_gmm(Some(0)).is_err());
    }

    #[test]
    fn estimate_on_demo_data_seeds_a_valid_mixture() {
        let data = generate_demo(10_000, 7).unwrap();
        let hist = Histogram::new(&data).unwrap();
        let est = hist.estimate_gmm(None).unwrap();
        assert!(!est.is_empty());
        assert_abs_diff_eq!(est.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

        let params = MixtureParameters::try_from(est).unwrap();
        assert!(params.variances().iter().all(|&v| v > 0.0));
    }
}
