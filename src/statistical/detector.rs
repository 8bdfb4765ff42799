// Statistical point-anomaly detector
//
// Stateless apart from its immutable configuration: every call computes its
// statistics from the arguments and returns fresh detections.

use crate::anomaly::{resolve_timestamps, AnomalyDetection, AnomalySeverity, AnomalyType};
use crate::baseline::BaselineMetrics;
use crate::error::Result;
use crate::statistical::config::{DetectionMethod, DetectorConfig};
use crate::stats;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Z-score / IQR anomaly detector
///
/// # Example
/// ```
/// use verdandi::statistical::{DetectionMethod, StatisticalDetector};
///
/// let detector = StatisticalDetector::new();
/// let mut latencies = vec![100.0; 30];
/// latencies[15] = 400.0;
///
/// let anomalies = detector.detect(&latencies, "latency", None, DetectionMethod::Combined);
/// assert_eq!(anomalies.len(), 1);
/// assert_eq!(anomalies[0].actual_value, 400.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatisticalDetector {
    config: DetectorConfig,
}

impl StatisticalDetector {
    /// Create a detector with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with a validated configuration
    pub fn with_config(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect anomalies with the chosen method
    ///
    /// `Combined` returns the z-score detections followed by the IQR
    /// detections, keeping only the first detection per data timestamp.
    pub fn detect(
        &self,
        values: &[f64],
        metric_name: &str,
        timestamps: Option<&[DateTime<Utc>]>,
        method: DetectionMethod,
    ) -> Vec<AnomalyDetection> {
        if values.len() < self.config.min_sample_size {
            tracing::debug!(
                metric = metric_name,
                samples = values.len(),
                min = self.config.min_sample_size,
                "not enough samples for detection"
            );
            return Vec::new();
        }

        let timestamps = resolve_timestamps(values.len(), timestamps);

        match method {
            DetectionMethod::ZScore => self.detect_zscore(values, metric_name, Some(&timestamps)),
            DetectionMethod::Iqr => self.detect_iqr(values, metric_name, Some(&timestamps)),
            DetectionMethod::Combined => {
                let zscore = self.detect_zscore(values, metric_name, Some(&timestamps));
                let iqr = self.detect_iqr(values, metric_name, Some(&timestamps));

                let mut seen = HashSet::new();
                let combined: Vec<AnomalyDetection> = zscore
                    .into_iter()
                    .chain(iqr)
                    .filter(|a| seen.insert(a.data_timestamp))
                    .collect();

                tracing::debug!(
                    metric = metric_name,
                    anomalies = combined.len(),
                    "combined detection finished"
                );
                combined
            }
        }
    }

    /// Detect anomalies by z-score over the series' own mean and population
    /// standard deviation
    pub fn detect_zscore(
        &self,
        values: &[f64],
        metric_name: &str,
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Vec<AnomalyDetection> {
        if values.len() < self.config.min_sample_size {
            return Vec::new();
        }

        let mean = stats::mean(values);
        let std_dev = stats::population_std_dev(values);

        // No variation: z-scores are undefined
        if std_dev == 0.0 {
            return Vec::new();
        }

        let timestamps = resolve_timestamps(values.len(), timestamps);

        let anomalies: Vec<AnomalyDetection> = values
            .iter()
            .zip(timestamps)
            .filter_map(|(&value, ts)| {
                let z_score = (value - mean) / std_dev;
                if z_score.abs() < self.config.z_threshold || z_score.is_nan() {
                    return None;
                }

                let anomaly_type = if z_score > 0.0 {
                    AnomalyType::Spike
                } else {
                    AnomalyType::Drop
                };

                Some(
                    AnomalyDetection::new(
                        metric_name,
                        anomaly_type,
                        AnomalySeverity::from_z_score(z_score),
                        value,
                        mean,
                        ts,
                    )
                    .with_z_score(z_score)
                    .with_bounded_confidence(confidence_from_z_score(z_score))
                    .with_description(format!(
                        "Z-score anomaly: {:.2} standard deviations from mean",
                        z_score
                    )),
                )
            })
            .collect();

        tracing::debug!(
            metric = metric_name,
            samples = values.len(),
            mean,
            std_dev,
            anomalies = anomalies.len(),
            "z-score detection finished"
        );

        anomalies
    }

    /// Detect anomalies outside Tukey's fences
    ///
    /// `expected_value` on the detections is the series median. The context
    /// map carries `iqr`, `lower_fence`, `upper_fence`, `q1` and `q3`.
    pub fn detect_iqr(
        &self,
        values: &[f64],
        metric_name: &str,
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Vec<AnomalyDetection> {
        if values.len() < self.config.min_sample_size {
            return Vec::new();
        }

        let sorted = stats::sorted(values);
        let q1 = stats::percentile(&sorted, 25.0);
        let q3 = stats::percentile(&sorted, 75.0);
        let median = stats::percentile(&sorted, 50.0);
        let iqr = q3 - q1;
        let lower_fence = q1 - self.config.iqr_multiplier * iqr;
        let upper_fence = q3 + self.config.iqr_multiplier * iqr;

        let timestamps = resolve_timestamps(values.len(), timestamps);

        let anomalies: Vec<AnomalyDetection> = values
            .iter()
            .zip(timestamps)
            .filter_map(|(&value, ts)| {
                let (anomaly_type, excess) = if value > upper_fence {
                    (AnomalyType::Spike, value - upper_fence)
                } else if value < lower_fence {
                    (AnomalyType::Drop, lower_fence - value)
                } else {
                    return None;
                };

                let fence_distance = if iqr > 0.0 { excess / iqr } else { 0.0 };

                Some(
                    AnomalyDetection::new(
                        metric_name,
                        anomaly_type,
                        AnomalySeverity::from_iqr_distance(fence_distance),
                        value,
                        median,
                        ts,
                    )
                    .with_bounded_confidence((0.5 + fence_distance * 0.1).min(0.99))
                    .with_context("iqr", iqr)
                    .with_context("lower_fence", lower_fence)
                    .with_context("upper_fence", upper_fence)
                    .with_context("q1", q1)
                    .with_context("q3", q3)
                    .with_description(format!(
                        "IQR outlier: {:.1} IQRs beyond fence",
                        fence_distance
                    )),
                )
            })
            .collect();

        tracing::debug!(
            metric = metric_name,
            samples = values.len(),
            lower_fence,
            upper_fence,
            anomalies = anomalies.len(),
            "IQR detection finished"
        );

        anomalies
    }

    /// Summarise a historical sample into a [`BaselineMetrics`] snapshot
    ///
    /// Empty input yields a zero-filled, invalid baseline.
    pub fn calculate_baseline(
        &self,
        values: &[f64],
        metric_name: &str,
        period_days: u32,
    ) -> BaselineMetrics {
        if values.is_empty() {
            return BaselineMetrics::empty(metric_name, period_days);
        }

        let sorted = stats::sorted(values);
        let p25 = stats::percentile(&sorted, 25.0);
        let p75 = stats::percentile(&sorted, 75.0);
        let iqr = p75 - p25;

        BaselineMetrics {
            metric_name: metric_name.to_string(),
            calculated_at: Utc::now(),
            sample_count: values.len(),
            baseline_period_days: period_days,
            mean: stats::mean(values),
            median: stats::percentile(&sorted, 50.0),
            std_dev: stats::population_std_dev(values),
            min_value: sorted[0],
            max_value: sorted[sorted.len() - 1],
            p5: stats::percentile(&sorted, 5.0),
            p25,
            p75,
            p95: stats::percentile(&sorted, 95.0),
            p99: stats::percentile(&sorted, 99.0),
            iqr,
            lower_fence: p25 - self.config.iqr_multiplier * iqr,
            upper_fence: p75 + self.config.iqr_multiplier * iqr,
        }
    }

    /// Detect anomalies against a previously computed baseline
    ///
    /// Returns nothing for an invalid baseline. A point is flagged when its
    /// z-score against the baseline reaches the threshold or it lies outside
    /// the baseline fences. Severity is the higher of the z-score band and
    /// the band for `|value - median| / iqr`.
    pub fn detect_with_baseline(
        &self,
        values: &[f64],
        baseline: &BaselineMetrics,
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Vec<AnomalyDetection> {
        if !baseline.is_valid() {
            tracing::warn!(
                metric = %baseline.metric_name,
                samples = baseline.sample_count,
                "baseline is not valid for detection, skipping"
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

                let iqr_distance = if baseline.iqr > 0.0 {
                    (value - baseline.median).abs() / baseline.iqr
                } else {
                    0.0
                };
                let severity = AnomalySeverity::from_z_score(z_score)
                    .max(AnomalySeverity::from_iqr_distance(iqr_distance));

                Some(
                    AnomalyDetection::new(
                        baseline.metric_name.as_str(),
                        anomaly_type,
                        severity,
                        value,
                        baseline.mean,
                        ts,
                    )
                    .with_z_score(z_score)
                    .with_bounded_confidence(confidence_from_z_score(z_score))
                    .with_description(format!(
                        "Anomaly detected against baseline (z={:.2})",
                        z_score
                    )),
                )
            })
            .collect()
    }

    /// Find level shifts by comparing adjacent windows
    ///
    /// For each boundary `i` in `window_size..len - window_size` the mean of
    /// the `window_size` values before `i` is compared with the mean of the
    /// `window_size` values from `i`, in units of the pooled population
    /// standard deviation. Every boundary at or above `z_threshold` is
    /// reported, so a single real shift usually yields a run of adjacent
    /// indices.
    pub fn find_change_points(&self, values: &[f64], window_size: usize) -> Vec<(usize, f64)> {
        if window_size == 0 || values.len() < 2 * window_size {
            return Vec::new();
        }

        let mut change_points = Vec::new();

        for i in window_size..values.len() - window_size {
            let before = &values[i - window_size..i];
            let after = &values[i..i + window_size];

            let before_mean = stats::mean(before);
            let after_mean = stats::mean(after);
            let pooled_std = ((stats::population_variance(before)
                + stats::population_variance(after))
                / 2.0)
                .sqrt();

            if pooled_std > 0.0 {
                let magnitude = (after_mean - before_mean).abs() / pooled_std;
                if magnitude >= self.config.z_threshold {
                    change_points.push((i, magnitude));
                }
            }
        }

        tracing::debug!(
            samples = values.len(),
            window_size,
            change_points = change_points.len(),
            "change point scan finished"
        );

        change_points
    }
}

/// `min(0.99, 1 - e^(-|z|/2))`
fn confidence_from_z_score(z_score: f64) -> f64 {
    (1.0 - (-0.5 * z_score.abs()).exp()).min(0.99)
}
