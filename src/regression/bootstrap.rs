// Bootstrap resampling of the difference of means
//
// Both groups are resampled with replacement; the sorted differences give
// empirical confidence intervals without any distributional assumption.

use crate::stats;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Empirical distribution of `mean(after) - mean(before)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapComparison {
    pub mean_difference: f64,
    pub ci_lower_95: f64,
    pub ci_upper_95: f64,
    pub ci_lower_99: f64,
    pub ci_upper_99: f64,
    /// Fraction of resampled differences above zero
    pub probability_regression: f64,
    pub iterations: usize,
}

/// Resample `iterations` times; `None` for an empty group or zero iterations
pub(crate) fn bootstrap_comparison<R: Rng + ?Sized>(
    before: &[f64],
    after: &[f64],
    iterations: usize,
    rng: &mut R,
) -> Option<BootstrapComparison> {
    if before.is_empty() || after.is_empty() || iterations == 0 {
        return None;
    }

    let mut differences: Vec<f64> = (0..iterations)
        .map(|_| resampled_mean(after, rng) - resampled_mean(before, rng))
        .collect();
    differences.sort_by(f64::total_cmp);

    let cut = |q: f64| {
        let idx = ((q * iterations as f64) as usize).min(iterations - 1);
        differences[idx]
    };

    let above_zero = differences.iter().filter(|&&d| d > 0.0).count();

    let result = BootstrapComparison {
        mean_difference: stats::mean(&differences),
        ci_lower_95: cut(0.025),
        ci_upper_95: cut(0.975),
        ci_lower_99: cut(0.005),
        ci_upper_99: cut(0.995),
        probability_regression: above_zero as f64 / iterations as f64,
        iterations,
    };

    tracing::debug!(
        iterations,
        mean_difference = result.mean_difference,
        probability_regression = result.probability_regression,
        "bootstrap comparison"
    );

    Some(result)
}

fn resampled_mean<R: Rng + ?Sized>(values: &[f64], rng: &mut R) -> f64 {
    let n = values.len();
    let sum: f64 = (0..n).map(|_| values[rng.gen_range(0..n)]).sum();
    sum / n as f64
}
