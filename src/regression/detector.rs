// Before/after regression detection
//
// "Before" and "after" are independent samples (e.g. latencies from two
// deployments). Only an increase counts as a regression: higher latency or
// error rate is worse.

use crate::anomaly::AnomalySeverity;
use crate::error::Result;
use crate::regression::bootstrap::{self, BootstrapComparison};
use crate::regression::config::RegressionConfig;
use crate::regression::statistics::{
    cohens_d, compare_distributions, welch_t_test, DistributionComparison,
};
use crate::regression::verdict::{RegressionResult, SignificanceTest};
use crate::stats;
use rand::Rng;
use std::collections::HashMap;

/// Effect sizes that raise severity regardless of percent change
const CRITICAL_EFFECT_SIZE: f64 = 1.2;
const HIGH_EFFECT_SIZE: f64 = 0.8;
const MEDIUM_EFFECT_SIZE: f64 = 0.5;

/// Cohen's d at which the effect-size half of the confidence saturates
const FULL_CONFIDENCE_EFFECT_SIZE: f64 = 0.8;

/// Detects statistically and practically significant regressions
///
/// # Example
/// ```
/// use verdandi::regression::RegressionDetector;
///
/// let before: Vec<f64> = [100.0, 102.0, 98.0, 101.0, 99.0].repeat(20);
/// let after: Vec<f64> = [150.0, 152.0, 148.0, 151.0, 149.0].repeat(20);
///
/// let result = RegressionDetector::new().detect(&before, &after, "api_latency");
/// assert!(result.is_regression);
/// assert!((result.mean_change_percent - 50.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegressionDetector {
    config: RegressionConfig,
}

impl RegressionDetector {
    /// Create a detector with the default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with validated thresholds
    pub fn with_config(config: RegressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Decide whether `after` regressed relative to `before`
    pub fn detect(&self, before: &[f64], after: &[f64], metric_name: &str) -> RegressionResult {
        if before.is_empty() || after.is_empty() {
            tracing::debug!(
                metric = metric_name,
                before = before.len(),
                after = after.len(),
                "regression check skipped, empty sample"
            );
            return RegressionResult::insufficient_data(metric_name);
        }

        let (n1, n2) = (before.len(), after.len());
        let before_mean = stats::mean(before);
        let after_mean = stats::mean(after);
        let before_std = stats::sample_std_dev(before);
        let after_std = stats::sample_std_dev(after);

        let before_p99 = stats::percentile(&stats::sorted(before), 99.0);
        let after_p99 = stats::percentile(&stats::sorted(after), 99.0);

        let mean_change_percent = stats::change_percent(before_mean, after_mean);
        let p99_change_percent = stats::change_percent(before_p99, after_p99);

        let welch = welch_t_test(before_mean, before_std, n1, after_mean, after_std, n2);
        let effect_size = cohens_d(before_mean, before_std, n1, after_mean, after_std, n2);

        let statistically_significant = welch.p_value < self.config.significance_level;
        let practically_significant = effect_size.abs() >= self.config.min_effect_size;
        let is_regression = statistically_significant
            && practically_significant
            && after_mean > before_mean
            && mean_change_percent >= self.config.regression_threshold_percent;

        let regression_severity = if is_regression {
            self.severity(mean_change_percent, p99_change_percent, effect_size)
        } else {
            AnomalySeverity::Info
        };

        let confidence = if statistically_significant {
            0.6 * (1.0 - welch.p_value)
                + 0.4 * (effect_size.abs() / FULL_CONFIDENCE_EFFECT_SIZE).min(1.0)
        } else {
            0.0
        };

        let description = if is_regression {
            format!(
                "Regression detected: mean increased by {:.1}%, P99 changed by {:+.1}% (p={:.4}, d={:.2})",
                mean_change_percent, p99_change_percent, welch.p_value, effect_size
            )
        } else if mean_change_percent < 0.0 {
            format!(
                "Performance improved by {:.1}% (mean)",
                mean_change_percent.abs()
            )
        } else {
            format!(
                "No significant regression detected (change: {:+.1}%)",
                mean_change_percent
            )
        };

        let recommendations = if is_regression {
            recommendations(regression_severity, mean_change_percent, p99_change_percent)
        } else {
            Vec::new()
        };

        tracing::debug!(
            metric = metric_name,
            t = welch.t_statistic,
            df = welch.degrees_of_freedom,
            p = welch.p_value,
            d = effect_size,
            is_regression,
            "regression check"
        );

        let test = SignificanceTest {
            t_statistic: welch.t_statistic,
            p_value: welch.p_value,
            effect_size,
            degrees_of_freedom: welch.degrees_of_freedom,
        };

        RegressionResult {
            before_mean,
            after_mean,
            before_p99,
            after_p99,
            before_sample_count: n1,
            after_sample_count: n2,
            mean_change_percent,
            p99_change_percent,
            is_regression,
            regression_severity,
            description,
            recommendations,
            ..RegressionResult::insufficient_data(metric_name)
        }
        .tested(test, confidence)
    }

    /// Run [`detect`](Self::detect) for every metric present in both maps
    pub fn detect_multiple(
        &self,
        before: &HashMap<String, Vec<f64>>,
        after: &HashMap<String, Vec<f64>>,
    ) -> HashMap<String, RegressionResult> {
        before
            .iter()
            .filter_map(|(name, before_values)| {
                after
                    .get(name)
                    .map(|after_values| (name.clone(), self.detect(before_values, after_values, name)))
            })
            .collect()
    }

    /// Mean-only shortcut: true if the mean rose by at least `threshold_percent`
    ///
    /// A zero `before` mean counts as a regression for any positive `after` mean.
    pub fn quick_check(&self, before: &[f64], after: &[f64], threshold_percent: f64) -> bool {
        if before.is_empty() || after.is_empty() {
            return false;
        }

        let before_mean = stats::mean(before);
        let after_mean = stats::mean(after);

        if before_mean == 0.0 {
            return after_mean > 0.0;
        }

        (after_mean - before_mean) / before_mean.abs() * 100.0 >= threshold_percent
    }

    /// Descriptive diff of the two samples; `None` if either is empty
    pub fn compare_distributions(
        &self,
        before: &[f64],
        after: &[f64],
    ) -> Option<DistributionComparison> {
        compare_distributions(before, after)
    }

    /// Bootstrap the difference of means using the thread-local RNG
    pub fn bootstrap_comparison(
        &self,
        before: &[f64],
        after: &[f64],
        iterations: usize,
    ) -> Option<BootstrapComparison> {
        bootstrap::bootstrap_comparison(before, after, iterations, &mut rand::thread_rng())
    }

    /// Bootstrap the difference of means with a caller-supplied RNG
    pub fn bootstrap_comparison_with_rng<R: Rng + ?Sized>(
        &self,
        before: &[f64],
        after: &[f64],
        iterations: usize,
        rng: &mut R,
    ) -> Option<BootstrapComparison> {
        bootstrap::bootstrap_comparison(before, after, iterations, rng)
    }

    fn severity(&self, mean_change: f64, p99_change: f64, effect_size: f64) -> AnomalySeverity {
        let max_change = mean_change.abs().max(p99_change.abs());
        let d = effect_size.abs();
        let critical = self.config.critical_threshold_percent;

        if max_change >= critical || d >= CRITICAL_EFFECT_SIZE {
            AnomalySeverity::Critical
        } else if max_change >= critical / 2.0 || d >= HIGH_EFFECT_SIZE {
            AnomalySeverity::High
        } else if max_change >= self.config.regression_threshold_percent || d >= MEDIUM_EFFECT_SIZE {
            AnomalySeverity::Medium
        } else {
            AnomalySeverity::Low
        }
    }
}

fn recommendations(severity: AnomalySeverity, mean_change: f64, p99_change: f64) -> Vec<String> {
    let mut recs = Vec::new();

    match severity {
        AnomalySeverity::Critical => recs.push(
            "CRITICAL regression detected. Consider rolling back the change immediately."
                .to_string(),
        ),
        AnomalySeverity::High => recs.push(
            "Significant regression detected. Investigate the root cause urgently.".to_string(),
        ),
        _ => {}
    }

    if p99_change > mean_change * 2.0 {
        recs.push(
            "P99 regression is larger than mean regression. \
             Investigate tail latency issues and timeout handling."
                .to_string(),
        );
    }

    recs.push(
        "Compare profiling data before and after the change to identify bottlenecks.".to_string(),
    );

    recs
}
