// Comparison of new batches against stored baselines
//
// The comparator never mutates the baseline it is given; each comparison
// owns a copy of it so the result is self-describing when persisted.

use crate::anomaly::{resolve_timestamps, AnomalyDetection, AnomalySeverity, AnomalyType};
use crate::baseline::config::ComparatorConfig;
use crate::baseline::metrics::{
    BaselineComparison, BaselineDrift, BaselineMetrics, ComparisonStatus,
};
use crate::error::Result;
use crate::stats;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Anomaly rate above which a batch is critical
const CRITICAL_ANOMALY_RATE: f64 = 0.25;

/// Anomaly rate above which a batch is degraded (and significant)
const DEGRADED_ANOMALY_RATE: f64 = 0.1;

/// Compares current metric batches against baselines
///
/// # Example
/// ```
/// use verdandi::baseline::{BaselineComparator, ComparisonStatus};
/// use verdandi::statistical::StatisticalDetector;
///
/// let history: Vec<f64> = (0..50).map(|i| 100.0 + (i % 5) as f64).collect();
/// let baseline = StatisticalDetector::new().calculate_baseline(&history, "latency", 7);
///
/// let comparison = BaselineComparator::new().compare(&[180.0; 10], &baseline, None);
/// assert_eq!(comparison.overall_status, ComparisonStatus::Critical);
/// assert!(comparison.is_significant);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineComparator {
    config: ComparatorConfig,
}

impl BaselineComparator {
    /// Create a comparator with the default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a comparator with validated thresholds
    pub fn with_config(config: ComparatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Compare a batch of current values against a baseline
    pub fn compare(
        &self,
        current_values: &[f64],
        baseline: &BaselineMetrics,
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> BaselineComparison {
        if current_values.is_empty() {
            return BaselineComparison::no_data(baseline);
        }

        let sorted = stats::sorted(current_values);
        let current_mean = stats::mean(current_values);
        let current_median = stats::percentile(&sorted, 50.0);
        let current_p99 = stats::percentile(&sorted, 99.0);

        let mean_change = stats::change_percent(baseline.mean, current_mean);
        let median_change = stats::change_percent(baseline.median, current_median);
        let p99_change = stats::change_percent(baseline.p99, current_p99);

        let anomalies = self.detect_anomalies(current_values, baseline, timestamps);
        let sample_count = current_values.len();

        let is_significant = mean_change.abs() >= self.config.significance_threshold
            || p99_change.abs() >= self.config.significance_threshold
            || anomalies.len() as f64 > sample_count as f64 * DEGRADED_ANOMALY_RATE;

        let status = self.determine_status(mean_change, p99_change, anomalies.len(), sample_count);
        let recommendations =
            self.generate_recommendations(mean_change, p99_change, &anomalies, status);

        tracing::debug!(
            metric = %baseline.metric_name,
            samples = sample_count,
            mean_change,
            p99_change,
            anomalies = anomalies.len(),
            status = %status,
            "baseline comparison finished"
        );

        BaselineComparison {
            compared_at: Utc::now(),
            metric_name: baseline.metric_name.clone(),
            baseline: baseline.clone(),
            current_mean,
            current_median,
            current_p99,
            sample_count,
            mean_change_percent: mean_change,
            median_change_percent: median_change,
            p99_change_percent: p99_change,
            is_significant,
            anomalies_detected: anomalies,
            overall_status: status,
            recommendations,
        }
    }

    /// Compare every metric that has both current data and a baseline
    pub fn compare_multiple(
        &self,
        current_data: &HashMap<String, Vec<f64>>,
        baselines: &HashMap<String, BaselineMetrics>,
    ) -> HashMap<String, BaselineComparison> {
        current_data
            .iter()
            .filter_map(|(name, values)| {
                let baseline = baselines.get(name)?;
                Some((name.clone(), self.compare(values, baseline, None)))
            })
            .collect()
    }

    /// Weighted deviation score of a single value
    ///
    /// `0.6 * |z| + 0.4 * (IQRs beyond the nearest fence)`. Zero at the
    /// baseline, and zero for an invalid baseline.
    pub fn calculate_deviation_score(&self, value: f64, baseline: &BaselineMetrics) -> f64 {
        if !baseline.is_valid() {
            return 0.0;
        }

        let z_component = if baseline.std_dev > 0.0 {
            (value - baseline.mean).abs() / baseline.std_dev
        } else {
            0.0
        };

        let iqr_component = if baseline.iqr > 0.0 {
            if value < baseline.lower_fence {
                (baseline.lower_fence - value) / baseline.iqr
            } else if value > baseline.upper_fence {
                (value - baseline.upper_fence) / baseline.iqr
            } else {
                0.0
            }
        } else {
            0.0
        };

        0.6 * z_component + 0.4 * iqr_component
    }

    /// Whether a value is within `tolerance` of the baseline
    ///
    /// Requires both `|z| <= tolerance * z_threshold` and a position inside
    /// `[p25 - tolerance * iqr, p75 + tolerance * iqr]`. An invalid baseline
    /// cannot judge anything and always answers `true`.
    pub fn is_within_baseline(&self, value: f64, baseline: &BaselineMetrics, tolerance: f64) -> bool {
        if !baseline.is_valid() {
            return true;
        }

        let z_score = if baseline.std_dev > 0.0 {
            (value - baseline.mean).abs() / baseline.std_dev
        } else {
            0.0
        };
        if z_score > tolerance * self.config.z_threshold {
            return false;
        }

        let expanded_lower = baseline.p25 - tolerance * baseline.iqr;
        let expanded_upper = baseline.p75 + tolerance * baseline.iqr;
        value >= expanded_lower && value <= expanded_upper
    }

    /// Drift between the oldest and newest of a chronological series of
    /// baselines
    ///
    /// Intermediate snapshots are not consulted.
    pub fn track_baseline_drift(&self, historical_baselines: &[BaselineMetrics]) -> BaselineDrift {
        if historical_baselines.len() < 2 {
            return BaselineDrift::default();
        }
        let first = &historical_baselines[0];
        let last = &historical_baselines[historical_baselines.len() - 1];

        let mean_drift = stats::change_percent(first.mean, last.mean);
        let std_drift = stats::change_percent(first.std_dev, last.std_dev);
        let p99_drift = stats::change_percent(first.p99, last.p99);

        BaselineDrift {
            mean_drift_percent: mean_drift,
            std_drift_percent: std_drift,
            p99_drift_percent: p99_drift,
            is_drifting: mean_drift.abs() >= self.config.significance_threshold
                || p99_drift.abs() >= self.config.significance_threshold,
        }
    }

    /// Per-point detection against the baseline
    ///
    /// Same trigger as `StatisticalDetector::detect_with_baseline` (z-score
    /// or fence breach) with the comparator's own z threshold; severity comes
    /// from the percent change against the baseline mean.
    fn detect_anomalies(
        &self,
        values: &[f64],
        baseline: &BaselineMetrics,
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Vec<AnomalyDetection> {
        if !baseline.is_valid() {
            tracing::warn!(
                metric = %baseline.metric_name,
                samples = baseline.sample_count,
                "baseline is not valid for per-point comparison, skipping anomaly detection"
            );
            return Vec::new();
        }

        let timestamps = resolve_timestamps(values.len(), timestamps);

        values
            .iter()
            .zip(timestamps)
            .filter_map(|(&value, ts)| {
                let z_score = if baseline.std_dev > 0.0 {
                    (value - baseline.mean) / baseline.std_dev
                } else {
                    0.0
                };
                let outside_fences =
                    value < baseline.lower_fence || value > baseline.upper_fence;

                if z_score.abs() < self.config.z_threshold && !outside_fences {
                    return None;
                }

                let anomaly_type = if value > baseline.mean {
                    AnomalyType::Spike
                } else {
                    AnomalyType::Drop
                };
                let change = stats::change_percent(baseline.mean, value);

                Some(
                    AnomalyDetection::new(
                        baseline.metric_name.as_str(),
                        anomaly_type,
                        self.severity_from_change(change),
                        value,
                        baseline.mean,
                        ts,
                    )
                    .with_deviation_percent(change.abs())
                    .with_z_score(z_score)
                    .with_bounded_confidence((z_score.abs() / 5.0).min(0.99))
                    .with_description(format!("Deviation from baseline: {:+.1}%", change)),
                )
            })
            .collect()
    }

    fn determine_status(
        &self,
        mean_change: f64,
        p99_change: f64,
        anomaly_count: usize,
        sample_count: usize,
    ) -> ComparisonStatus {
        let anomaly_rate = if sample_count > 0 {
            anomaly_count as f64 / sample_count as f64
        } else {
            0.0
        };
        let largest = mean_change.abs().max(p99_change.abs());

        if largest >= self.config.critical_change_percent || anomaly_rate > CRITICAL_ANOMALY_RATE {
            ComparisonStatus::Critical
        } else if largest >= self.config.high_change_percent
            || anomaly_rate > DEGRADED_ANOMALY_RATE
        {
            ComparisonStatus::Degraded
        } else if largest >= self.config.significance_threshold {
            ComparisonStatus::Changed
        } else {
            ComparisonStatus::Normal
        }
    }

    fn severity_from_change(&self, change_percent: f64) -> AnomalySeverity {
        let abs_change = change_percent.abs();
        if abs_change >= self.config.critical_change_percent {
            AnomalySeverity::Critical
        } else if abs_change >= self.config.high_change_percent {
            AnomalySeverity::High
        } else if abs_change >= self.config.significance_threshold {
            AnomalySeverity::Medium
        } else if abs_change >= self.config.significance_threshold / 2.0 {
            AnomalySeverity::Low
        } else {
            AnomalySeverity::Info
        }
    }

    fn generate_recommendations(
        &self,
        mean_change: f64,
        p99_change: f64,
        anomalies: &[AnomalyDetection],
        status: ComparisonStatus,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if status == ComparisonStatus::Critical {
            recommendations.push(
                "CRITICAL: Performance has degraded significantly from baseline. \
                 Investigate immediately for recent changes."
                    .to_string(),
            );
        }

        if mean_change > self.config.high_change_percent {
            recommendations.push(format!(
                "Mean latency increased by {:.1}%. \
                 Check for resource constraints or inefficient code paths.",
                mean_change
            ));
        } else if mean_change < -self.config.high_change_percent {
            recommendations.push(format!(
                "Mean latency decreased by {:.1}%. \
                 Verify this improvement is real and not due to reduced load.",
                mean_change.abs()
            ));
        }

        if p99_change > self.config.critical_change_percent {
            recommendations.push(format!(
                "P99 latency increased by {:.1}%. \
                 Tail latency issues indicate potential timeout problems.",
                p99_change
            ));
        }

        let critical_count = anomalies
            .iter()
            .filter(|a| a.severity == AnomalySeverity::Critical)
            .count();
        if critical_count > 0 {
            recommendations.push(format!(
                "{} critical anomalies detected. \
                 Review specific timestamps for incident correlation.",
                critical_count
            ));
        }

        recommendations
    }
}
