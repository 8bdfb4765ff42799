// Before/after regression detection with hypothesis testing
//
// Two independent samples are compared with Welch's t-test (no equal
// variance assumption) and Cohen's d. A change is a regression only when it
// is statistically significant, large enough to matter, upward, and above a
// configurable percent threshold. A bootstrap of the difference of means is
// available as an assumption-free cross-check.
//
// [1] Welch, B. L. (1947). The generalization of "Student's" problem when
//     several different population variances are involved. Biometrika 34.
// [2] Cohen, J. (1988). Statistical Power Analysis for the Behavioral
//     Sciences. Effect size conventions: 0.2 small, 0.5 medium, 0.8 large.
// [3] Efron, B. (1979). Bootstrap methods: another look at the jackknife.

mod bootstrap;
mod config;
mod detector;
mod statistics;
mod verdict;

pub use bootstrap::BootstrapComparison;
pub use config::RegressionConfig;
pub use detector::RegressionDetector;
pub use statistics::{
    cohens_d, compare_distributions, normal_cdf, t_distribution_p_value, welch_t_test,
    DistributionComparison, WelchTest,
};
pub use verdict::{RegressionResult, SignificanceTest};
