// Baseline snapshot and comparison result models

use crate::anomaly::AnomalyDetection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum sample count for a baseline to be usable
pub const MIN_BASELINE_SAMPLES: usize = 10;

/// Statistical summary of a historical sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub metric_name: String,
    pub calculated_at: DateTime<Utc>,
    pub sample_count: usize,
    pub baseline_period_days: u32,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub p5: f64,
    /// Q1
    pub p25: f64,
    /// Q3
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    /// `p75 - p25`
    pub iqr: f64,
    /// `p25 - k * iqr`
    pub lower_fence: f64,
    /// `p75 + k * iqr`
    pub upper_fence: f64,
}

impl BaselineMetrics {
    /// A zero-filled (and therefore invalid) baseline
    pub fn empty(metric_name: impl Into<String>, baseline_period_days: u32) -> Self {
        Self {
            metric_name: metric_name.into(),
            calculated_at: Utc::now(),
            sample_count: 0,
            baseline_period_days,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min_value: 0.0,
            max_value: 0.0,
            p5: 0.0,
            p25: 0.0,
            p75: 0.0,
            p95: 0.0,
            p99: 0.0,
            iqr: 0.0,
            lower_fence: 0.0,
            upper_fence: 0.0,
        }
    }

    /// Enough samples and non-zero spread
    ///
    /// Invalid baselines must not be used for z-score or fence comparisons;
    /// the detectors return no anomalies for them.
    pub fn is_valid(&self) -> bool {
        self.sample_count >= MIN_BASELINE_SAMPLES && self.std_dev > 0.0
    }
}

/// Overall verdict of a batch-vs-baseline comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Normal,
    Changed,
    Degraded,
    Critical,
    NoData,
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComparisonStatus::Normal => "normal",
            ComparisonStatus::Changed => "changed",
            ComparisonStatus::Degraded => "degraded",
            ComparisonStatus::Critical => "critical",
            ComparisonStatus::NoData => "no_data",
        };
        f.write_str(name)
    }
}

/// Result of comparing one batch against one baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub compared_at: DateTime<Utc>,
    pub metric_name: String,
    /// Copy of the baseline the batch was compared against
    pub baseline: BaselineMetrics,
    pub current_mean: f64,
    pub current_median: f64,
    pub current_p99: f64,
    pub sample_count: usize,
    pub mean_change_percent: f64,
    pub median_change_percent: f64,
    pub p99_change_percent: f64,
    pub is_significant: bool,
    pub anomalies_detected: Vec<AnomalyDetection>,
    pub overall_status: ComparisonStatus,
    pub recommendations: Vec<String>,
}

impl BaselineComparison {
    /// Comparison for an empty batch
    pub fn no_data(baseline: &BaselineMetrics) -> Self {
        Self {
            compared_at: Utc::now(),
            metric_name: baseline.metric_name.clone(),
            baseline: baseline.clone(),
            current_mean: 0.0,
            current_median: 0.0,
            current_p99: 0.0,
            sample_count: 0,
            mean_change_percent: 0.0,
            median_change_percent: 0.0,
            p99_change_percent: 0.0,
            is_significant: false,
            anomalies_detected: Vec::new(),
            overall_status: ComparisonStatus::NoData,
            recommendations: Vec::new(),
        }
    }

    /// Fraction of the batch flagged as anomalous
    pub fn anomaly_rate(&self) -> f64 {
        if self.sample_count == 0 {
            0.0
        } else {
            self.anomalies_detected.len() as f64 / self.sample_count as f64
        }
    }
}

/// Drift between the first and last of a sequence of baselines
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineDrift {
    pub mean_drift_percent: f64,
    pub std_drift_percent: f64,
    pub p99_drift_percent: f64,
    pub is_drifting: bool,
}
