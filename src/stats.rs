//! Descriptive statistics shared by the detectors
//!
//! All functions are total: empty input yields `0.0` instead of NaN so that
//! callers can treat "not enough data" uniformly.

/// Arithmetic mean (0.0 for empty input)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    population_variance(values).sqrt()
}

/// Population variance (divides by N)
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divides by N-1, 0.0 when N < 2)
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Return a sorted copy of `values`
///
/// Uses the IEEE 754 total order: positive NaN sorts after `+inf`, negative
/// NaN before `-inf`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolated percentile over already sorted data
///
/// `percentile` is in `[0, 100]`. The rank is `(p / 100) * (n - 1)` and the
/// result interpolates between the neighbouring ranks.
///
/// # Example
/// ```
/// use verdandi::stats::percentile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&sorted, 50.0), 2.5);
/// assert_eq!(percentile(&sorted, 100.0), 4.0);
/// ```
pub fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let n = sorted_data.len();
    if n == 1 {
        return sorted_data[0];
    }

    let rank = (percentile / 100.0) * (n - 1) as f64;
    let lower = (rank.floor().max(0.0) as usize).min(n - 1);
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;

    sorted_data[lower] + fraction * (sorted_data[upper] - sorted_data[lower])
}

/// Percentage change from `base` to `current`
///
/// Returns 0 when both are zero and 100 when only the base is zero, so a
/// metric appearing from nothing reads as a full increase.
pub fn change_percent(base: f64, current: f64) -> f64 {
    if base == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    (current - base) / base.abs() * 100.0
}
