//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::{ClassifyOutput, HistogramOutput, LoadedSamples, RunOutput, SeedOrigin};
use crate::domain::MixtureParameters;
use crate::histogram::{GmmEstimate, Histogram};

/// Format the full `gmm fit` summary (samples + seed + fit diagnostics + components).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== gmm - Gaussian Mixture Fit (EM) ===\n");
    out.push_str(&format_samples(&run.samples));

    out.push_str("\nSeed:\n");
    let origin = match &run.seed_origin {
        SeedOrigin::Explicit => "explicit".to_string(),
        SeedOrigin::Histogram { bins, min_gap } => {
            format!("histogram estimate ({bins} bins, min_gap={min_gap})")
        }
        SeedOrigin::Moments => "sample moments (no histogram interval)".to_string(),
    };
    out.push_str(&format!("- origin   : {origin}\n"));
    out.push_str(&format!("- means    : {}\n", fmt_vec(run.seed.means())));
    out.push_str(&format!("- variances: {}\n", fmt_vec(run.seed.variances())));
    out.push_str(&format!("- weights  : {}\n", fmt_vec(run.seed.weights())));

    if let Some(search) = &run.search {
        out.push_str("\nSearch:\n");
        out.push_str(&format!(
            "- rounds={} | candidates={} | failed={}\n",
            search.rounds, search.candidates_evaluated, search.candidates_failed
        ));
    }

    out.push_str("\nFit:\n");
    out.push_str(&format!(
        "- log-likelihood={:.6} | iterations={} | stop={}\n",
        run.fit.log_likelihood,
        run.fit.iterations,
        run.fit.stop.display_name()
    ));

    out.push('\n');
    out.push_str(&format_components(&run.fit.params, &run.counts, run.unassigned));
    out
}

/// Format the `gmm histogram` output: TSV listing, then the proposal.
pub fn format_histogram_report(output: &HistogramOutput) -> String {
    let mut out = String::new();
    out.push_str(&format_histogram_tsv(&output.histogram));
    out.push('\n');
    out.push_str(&format!(
        "Range: [{:.4}, {:.4}] | bins={} | width={:.4} | binned={} of {}\n",
        output.histogram.low(),
        output.histogram.high(),
        output.histogram.num_bins(),
        output.histogram.bin_width(),
        output.histogram.total(),
        output.samples.values.len()
    ));
    match &output.estimate {
        Ok(est) => out.push_str(&format_estimate(est, output.min_gap)),
        Err(e) => out.push_str(&format!("No estimate: {e}\n")),
    }
    out
}

/// Format the `gmm classify` output.
pub fn format_classify_summary(output: &ClassifyOutput) -> String {
    let mut out = String::new();
    out.push_str("=== gmm - Classification ===\n");
    out.push_str(&format_samples(&output.samples));
    out.push_str(&format!(
        "Model: {} component(s), fitted on n={} (log-likelihood={:.6})\n\n",
        output.params.len(),
        output.model.n_samples,
        output.model.log_likelihood
    ));
    if let Some(ll) = output.log_likelihood {
        out.push_str(&format!("Log-likelihood of these samples: {ll:.6}\n\n"));
    }
    out.push_str(&format_components(&output.params, &output.counts, output.unassigned));
    out
}

/// Tab-separated bin listing: `Bin\tFrequency`, one row per bin.
///
/// Bins are labelled `[lo ~ hi)`; the last one is closed, `[lo ~ hi]`.
pub fn format_histogram_tsv(hist: &Histogram) -> String {
    let mut out = String::from("Bin\tFrequency\n");
    let last = hist.num_bins() - 1;
    for (i, count) in hist.counts().iter().enumerate() {
        let (lo, hi) = hist.bin_edges(i);
        let close = if i == last { ']' } else { ')' };
        out.push_str(&format!("[{lo:.4} ~ {hi:.4}{close}\t{count}\n"));
    }
    out
}

fn format_estimate(est: &GmmEstimate, min_gap: usize) -> String {
    let mut out = format!("\nEstimated mixture (min_gap={min_gap}): {} component(s)\n", est.len());
    if est.is_empty() {
        return out;
    }
    out.push_str(&format!("- means    : {}\n", fmt_vec(&est.means)));
    out.push_str(&format!("- variances: {}\n", fmt_vec(&est.variances)));
    out.push_str(&format!("- weights  : {}\n", fmt_vec(&est.weights)));
    out
}

fn format_samples(samples: &LoadedSamples) -> String {
    let (lo, hi) = samples
        .values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let mut out = format!(
        "Samples: n={} | range=[{lo:.4}, {hi:.4}] | source={}\n",
        samples.values.len(),
        samples.origin
    );
    if !samples.row_errors.is_empty() {
        out.push_str(&format!(
            "Skipped rows: {} of {}\n",
            samples.row_errors.len(),
            samples.rows_read
        ));
        for e in samples.row_errors.iter().take(5) {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
    }
    out
}

/// Component table with per-component label counts.
fn format_components(params: &MixtureParameters, counts: &[usize], unassigned: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>3} {:>12} {:>12} {:>12} {:>10} {:>8}",
            "k", "mean", "variance", "std_dev", "weight", "count"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<3} {:-<12} {:-<12} {:-<12} {:-<10} {:-<8}\n",
        "", "", "", "", "", ""
    ));

    for (k, c) in params.components().iter().enumerate() {
        out.push_str(&format!(
            "{:>3} {:>12.6} {:>12.6} {:>12.6} {:>10.6} {:>8}\n",
            k,
            c.mean,
            c.variance,
            params.std_dev(k),
            c.weight,
            counts.get(k).copied().unwrap_or(0)
        ));
    }
    out.push_str(&format!("Unassigned (outside every 3-sigma envelope): {unassigned}\n"));
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_tsv_labels() {
        let hist = Histogram::with_range(&[0.0, 0.5, 1.0, 2.0], 0.0, 2.0, 2).unwrap();
        let tsv = format_histogram_tsv(&hist);
        assert_eq!(
            tsv,
            "Bin\tFrequency\n[0.0000 ~ 1.0000)\t2\n[1.0000 ~ 2.0000]\t2\n"
        );
    }

    #[test]
    fn component_table_lists_every_component() {
        let params = MixtureParameters::new(vec![1.0, 4.0], vec![1.0, 4.0], vec![0.3, 0.7]).unwrap();
        let table = format_components(&params, &[3, 7], 1);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("1.000000"));
        assert!(lines[3].contains("2.000000"));
        assert!(lines[3].trim_end().ends_with('7'));
        assert!(lines[4].ends_with(": 1"));
    }

    #[test]
    fn fmt_vec_basic() {
        assert_eq!(fmt_vec(&[1.0, -0.5]), "[1.000000, -0.500000]");
        assert_eq!(fmt_vec(&[]), "[]");
    }
}
