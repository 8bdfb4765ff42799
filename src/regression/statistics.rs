// Hypothesis testing primitives for regression detection
//
// - Welch's t-test: two-sample test that does not assume equal variances
// - Welch-Satterthwaite degrees of freedom
// - Cohen's d with pooled standard deviation for effect size
// - Two-tailed p-value: Student's t via the regularized incomplete beta
//   function for df <= 30, standard normal tail for larger df
//
// The incomplete beta uses Lentz's continued fraction and a Lanczos
// ln-gamma. For a fixed df the p-value never increases as |t| grows.

use crate::stats;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

/// Degrees of freedom above which the normal approximation is used
const NORMAL_APPROX_DF: f64 = 30.0;

/// Result of Welch's t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// t-statistic, positive when the second group has the larger mean
    pub t_statistic: f64,

    /// p-value (two-tailed) - probability that the difference is due to chance
    /// - p < 0.05: statistically significant
    /// - p >= 0.05: not significant (noise/random variation)
    pub p_value: f64,

    /// Welch-Satterthwaite degrees of freedom (0 when the test was not run)
    pub degrees_of_freedom: f64,
}

impl WelchTest {
    fn untestable() -> Self {
        Self {
            t_statistic: 0.0,
            p_value: 1.0,
            degrees_of_freedom: 0.0,
        }
    }
}

/// Welch's t-test from summary statistics
///
/// `std1`/`std2` are sample standard deviations. Groups with fewer than two
/// samples cannot be tested (p = 1). When neither group varies the result is
/// an exact equality check: p = 1 for equal means, p = 0 otherwise.
///
/// # Example
/// ```
/// use verdandi::regression::welch_t_test;
///
/// let test = welch_t_test(100.0, 2.0, 30, 110.0, 2.0, 30);
/// assert!(test.t_statistic > 0.0);
/// assert!(test.p_value < 0.001);
/// ```
pub fn welch_t_test(mean1: f64, std1: f64, n1: usize, mean2: f64, std2: f64, n2: usize) -> WelchTest {
    if n1 < 2 || n2 < 2 {
        return WelchTest::untestable();
    }

    if std1 == 0.0 && std2 == 0.0 {
        return WelchTest {
            t_statistic: 0.0,
            p_value: if mean1 == mean2 { 1.0 } else { 0.0 },
            degrees_of_freedom: (n1 + n2 - 2) as f64,
        };
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let se1 = std1 * std1 / n1f;
    let se2 = std2 * std2 / n2f;
    let se_total = se1 + se2;

    if se_total == 0.0 {
        return WelchTest::untestable();
    }

    let t_statistic = (mean2 - mean1) / se_total.sqrt();

    let pooled_df = (n1 + n2 - 2) as f64;
    let degrees_of_freedom = if se1 == 0.0 || se2 == 0.0 {
        pooled_df
    } else {
        let denominator = se1 * se1 / (n1f - 1.0) + se2 * se2 / (n2f - 1.0);
        if denominator > 0.0 {
            se_total * se_total / denominator
        } else {
            pooled_df
        }
    };

    WelchTest {
        t_statistic,
        p_value: t_distribution_p_value(t_statistic.abs(), degrees_of_freedom),
        degrees_of_freedom,
    }
}

/// Cohen's d with pooled standard deviation
///
/// `(mean2 - mean1) / sqrt(((n1-1)s1² + (n2-1)s2²) / (n1+n2-2))`; 0 when
/// either group has fewer than two samples or the pooled spread is zero.
pub fn cohens_d(mean1: f64, std1: f64, n1: usize, mean2: f64, std2: f64, n2: usize) -> f64 {
    if n1 < 2 || n2 < 2 {
        return 0.0;
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let pooled_variance =
        ((n1f - 1.0) * std1 * std1 + (n2f - 1.0) * std2 * std2) / (n1f + n2f - 2.0);
    let pooled_std = pooled_variance.sqrt();

    if pooled_std == 0.0 {
        return 0.0;
    }

    (mean2 - mean1) / pooled_std
}

/// Descriptive before/after diff, no hypothesis testing
///
/// Standard deviations are sample standard deviations (N-1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionComparison {
    pub before_mean: f64,
    pub after_mean: f64,
    pub mean_change_percent: f64,
    pub before_std: f64,
    pub after_std: f64,
    pub std_change_percent: f64,
    pub before_p50: f64,
    pub after_p50: f64,
    pub before_p90: f64,
    pub after_p90: f64,
    pub before_p99: f64,
    pub after_p99: f64,
    pub before_min: f64,
    pub after_min: f64,
    pub before_max: f64,
    pub after_max: f64,
}

/// Compare the shape of two samples; `None` if either is empty
pub fn compare_distributions(before: &[f64], after: &[f64]) -> Option<DistributionComparison> {
    if before.is_empty() || after.is_empty() {
        return None;
    }

    let sorted_before = stats::sorted(before);
    let sorted_after = stats::sorted(after);

    let before_mean = stats::mean(before);
    let after_mean = stats::mean(after);
    let before_std = stats::sample_std_dev(before);
    let after_std = stats::sample_std_dev(after);

    Some(DistributionComparison {
        before_mean,
        after_mean,
        mean_change_percent: stats::change_percent(before_mean, after_mean),
        before_std,
        after_std,
        std_change_percent: stats::change_percent(before_std, after_std),
        before_p50: stats::percentile(&sorted_before, 50.0),
        after_p50: stats::percentile(&sorted_after, 50.0),
        before_p90: stats::percentile(&sorted_before, 90.0),
        after_p90: stats::percentile(&sorted_after, 90.0),
        before_p99: stats::percentile(&sorted_before, 99.0),
        after_p99: stats::percentile(&sorted_after, 99.0),
        before_min: sorted_before[0],
        after_min: sorted_after[0],
        before_max: sorted_before[sorted_before.len() - 1],
        after_max: sorted_after[sorted_after.len() - 1],
    })
}

/// Two-tailed p-value of a t-statistic with `df` degrees of freedom
pub fn t_distribution_p_value(t: f64, df: f64) -> f64 {
    if df <= 0.0 || t.is_nan() {
        return 1.0;
    }

    let t = t.abs();
    let p = if df > NORMAL_APPROX_DF {
        erfc(t / SQRT_2)
    } else {
        let x = df / (df + t * t);
        regularized_incomplete_beta(x, df / 2.0, 0.5)
    };

    p.clamp(0.0, 1.0)
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 - 0.5 * erfc(x / SQRT_2)
    } else {
        0.5 * erfc(-x / SQRT_2)
    }
}

/// Complementary error function for x >= 0 (Abramowitz & Stegun 7.1.26)
///
/// Computed directly rather than as `1 - erf(x)` to keep precision in the
/// tail.
fn erfc(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let x = x.max(0.0);
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    poly * (-x * x).exp()
}

/// Regularized incomplete beta function I_x(a, b)
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let front = (a * x.ln() + b * (1.0 - x).ln() - ln_beta).exp();

    // I_x(a,b) = 1 - I_{1-x}(b,a) keeps the continued fraction convergent
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Continued fraction for the incomplete beta function (Lentz's algorithm)
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-30;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - (a + b) * x / (a + 1.0));
    let mut f = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;

        let even = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        f *= c * d;

        let odd = -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    f
}

/// Lanczos approximation of ln(Gamma(x))
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFS[0];
    for (i, &c) in COEFFS[1..].iter().enumerate() {
        sum += c / (x + 1.0 + i as f64);
    }

    let t = x + 7.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!(ln_gamma(2.0).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - 0.5 * PI.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.959964) - 0.975).abs() < 1e-6);
        assert!((normal_cdf(-1.959964) - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_t_p_value_reference_points() {
        // t = 2.228 with df = 10 is the two-tailed 5% critical value
        assert!((t_distribution_p_value(2.228, 10.0) - 0.05).abs() < 1e-3);
        // t = 12.706 with df = 1
        assert!((t_distribution_p_value(12.706, 1.0) - 0.05).abs() < 1e-3);
        // Large df: normal regime, 1.96 -> 0.05
        assert!((t_distribution_p_value(1.96, 100.0) - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_t_p_value_zero_t_is_one() {
        assert!((t_distribution_p_value(0.0, 5.0) - 1.0).abs() < 1e-12);
        assert!((t_distribution_p_value(0.0, 50.0) - 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_t_p_value_monotonic_in_t() {
        for df in [1.0, 2.5, 7.0, 29.0, 31.0, 200.0] {
            let mut previous = 1.0 + 1e-12;
            for step in 0..200 {
                let t = step as f64 * 0.1;
                let p = t_distribution_p_value(t, df);
                assert!((0.0..=1.0).contains(&p));
                assert!(p <= previous + 1e-12, "df={df} t={t} p={p} prev={previous}");
                previous = p;
            }
        }
    }

    #[test]
    fn test_t_p_value_invalid_df() {
        assert_eq!(t_distribution_p_value(3.0, 0.0), 1.0);
        assert_eq!(t_distribution_p_value(f64::NAN, 10.0), 1.0);
    }

    #[test]
    fn test_welch_small_groups_untestable() {
        let test = welch_t_test(1.0, 1.0, 1, 5.0, 1.0, 10);
        assert_eq!(test.t_statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_welch_zero_variance_exact_check() {
        assert_eq!(welch_t_test(5.0, 0.0, 10, 5.0, 0.0, 10).p_value, 1.0);
        assert_eq!(welch_t_test(5.0, 0.0, 10, 6.0, 0.0, 10).p_value, 0.0);
    }

    #[test]
    fn test_welch_satterthwaite_df() {
        // Equal variances and sizes: df = 2n - 2
        let test = welch_t_test(10.0, 2.0, 10, 12.0, 2.0, 10);
        assert!((test.degrees_of_freedom - 18.0).abs() < 1e-9);
        // t = 2 / sqrt(0.4 + 0.4)
        assert!((test.t_statistic - 2.0 / 0.8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_welch_one_sided_zero_variance_uses_pooled_df() {
        let test = welch_t_test(10.0, 0.0, 8, 12.0, 3.0, 12);
        assert_eq!(test.degrees_of_freedom, 18.0);
    }

    #[test]
    fn test_welch_direction() {
        assert!(welch_t_test(10.0, 1.0, 20, 12.0, 1.0, 20).t_statistic > 0.0);
        assert!(welch_t_test(12.0, 1.0, 20, 10.0, 1.0, 20).t_statistic < 0.0);
    }

    #[test]
    fn test_cohens_d() {
        // Equal std 2, means 10 -> 12: d = 1
        assert!((cohens_d(10.0, 2.0, 20, 12.0, 2.0, 20) - 1.0).abs() < 1e-12);
        assert!((cohens_d(12.0, 2.0, 20, 10.0, 2.0, 20) + 1.0).abs() < 1e-12);
        assert_eq!(cohens_d(10.0, 0.0, 20, 12.0, 0.0, 20), 0.0);
        assert_eq!(cohens_d(10.0, 2.0, 1, 12.0, 2.0, 20), 0.0);
    }

    #[test]
    fn test_compare_distributions_empty() {
        assert!(compare_distributions(&[], &[1.0]).is_none());
        assert!(compare_distributions(&[1.0], &[]).is_none());
    }

    #[test]
    fn test_compare_distributions_fields() {
        let before: Vec<f64> = (1..=11).map(|i| i as f64).collect();
        let after: Vec<f64> = before.iter().map(|v| v * 2.0).collect();
        let diff = compare_distributions(&before, &after).unwrap();

        assert_eq!(diff.before_mean, 6.0);
        assert_eq!(diff.after_mean, 12.0);
        assert!((diff.mean_change_percent - 100.0).abs() < 1e-9);
        assert!((diff.std_change_percent - 100.0).abs() < 1e-9);
        assert_eq!(diff.before_p50, 6.0);
        assert_eq!(diff.after_p90, 20.0);
        assert_eq!(diff.before_min, 1.0);
        assert_eq!(diff.after_max, 22.0);
    }
}
