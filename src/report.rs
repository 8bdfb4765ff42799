//! Aggregated anomaly report over an analysis window
//!
//! Counts, anomaly rate, health status and recommendations are derived from
//! the collected detections and recomputed by every `add_*` call.

use crate::anomaly::{AnomalyDetection, AnomalySeverity};
use crate::baseline::{BaselineComparison, ComparisonStatus};
use crate::regression::RegressionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Anomaly rate above which the window is degraded
const DEGRADED_ANOMALY_RATE: f64 = 0.1;

/// Overall health of the analyzed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Degraded,
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Report combining point anomalies, baseline comparisons and regressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub generated_at: DateTime<Utc>,
    pub analysis_period_start: DateTime<Utc>,
    pub analysis_period_end: DateTime<Utc>,
    /// Distinct metric names seen across all inputs
    pub metrics_analyzed: usize,
    pub data_points_analyzed: usize,

    pub anomalies: Vec<AnomalyDetection>,
    pub baseline_comparisons: Vec<BaselineComparison>,
    pub regressions: Vec<RegressionResult>,

    pub total_anomalies: usize,
    pub critical_anomalies: usize,
    pub high_anomalies: usize,
    pub medium_anomalies: usize,
    pub low_anomalies: usize,
    /// Anomalies per analyzed data point
    pub anomaly_rate: f64,
    pub health_status: HealthStatus,
    pub recommendations: Vec<String>,
}

impl AnomalyReport {
    pub fn new(period_start: DateTime<Utc>, period_end: DateTime<Utc>) -> Self {
        Self {
            generated_at: Utc::now(),
            analysis_period_start: period_start,
            analysis_period_end: period_end,
            metrics_analyzed: 0,
            data_points_analyzed: 0,
            anomalies: Vec::new(),
            baseline_comparisons: Vec::new(),
            regressions: Vec::new(),
            total_anomalies: 0,
            critical_anomalies: 0,
            high_anomalies: 0,
            medium_anomalies: 0,
            low_anomalies: 0,
            anomaly_rate: 0.0,
            health_status: HealthStatus::Healthy,
            recommendations: Vec::new(),
        }
    }

    /// Record detections made over `data_points` values
    pub fn add_anomalies(&mut self, data_points: usize, anomalies: Vec<AnomalyDetection>) {
        self.data_points_analyzed += data_points;
        self.anomalies.extend(anomalies);
        self.refresh();
    }

    pub fn add_comparison(&mut self, comparison: BaselineComparison) {
        self.data_points_analyzed += comparison.sample_count;
        self.baseline_comparisons.push(comparison);
        self.refresh();
    }

    pub fn add_regression(&mut self, regression: RegressionResult) {
        self.regressions.push(regression);
        self.refresh();
    }

    /// Any critical anomaly (direct or from a comparison) or critical-severity
    /// regression
    pub fn has_critical_issues(&self) -> bool {
        self.critical_anomalies > 0
            || self
                .regressions
                .iter()
                .any(|r| r.regression_severity == AnomalySeverity::Critical)
    }

    /// Direct detections followed by those found in baseline comparisons
    pub fn all_anomalies(&self) -> impl Iterator<Item = &AnomalyDetection> {
        self.anomalies.iter().chain(
            self.baseline_comparisons
                .iter()
                .flat_map(|c| c.anomalies_detected.iter()),
        )
    }

    fn refresh(&mut self) {
        let (mut critical, mut high, mut medium, mut low, mut total) = (0, 0, 0, 0, 0);
        for anomaly in self.all_anomalies() {
            match anomaly.severity {
                AnomalySeverity::Critical => critical += 1,
                AnomalySeverity::High => high += 1,
                AnomalySeverity::Medium => medium += 1,
                AnomalySeverity::Low => low += 1,
                AnomalySeverity::Info => {}
            }
            total += 1;
        }
        self.critical_anomalies = critical;
        self.high_anomalies = high;
        self.medium_anomalies = medium;
        self.low_anomalies = low;
        self.total_anomalies = total;

        self.anomaly_rate = if self.data_points_analyzed > 0 {
            self.total_anomalies as f64 / self.data_points_analyzed as f64
        } else {
            0.0
        };

        let metrics: BTreeSet<&str> = self
            .anomalies
            .iter()
            .map(|a| a.metric_name.as_str())
            .chain(self.baseline_comparisons.iter().map(|c| c.metric_name.as_str()))
            .chain(self.regressions.iter().map(|r| r.metric_name.as_str()))
            .collect();
        self.metrics_analyzed = metrics.len();

        self.health_status = self.derive_health();
        self.recommendations = self.derive_recommendations();
    }

    fn derive_health(&self) -> HealthStatus {
        let comparison_is = |status: ComparisonStatus| {
            self.baseline_comparisons
                .iter()
                .any(|c| c.overall_status == status)
        };

        if self.has_critical_issues() || comparison_is(ComparisonStatus::Critical) {
            HealthStatus::Critical
        } else if self.high_anomalies > 0
            || self.regressions.iter().any(|r| r.is_regression)
            || comparison_is(ComparisonStatus::Degraded)
            || self.anomaly_rate > DEGRADED_ANOMALY_RATE
        {
            HealthStatus::Degraded
        } else if self.total_anomalies > 0 || comparison_is(ComparisonStatus::Changed) {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    fn derive_recommendations(&self) -> Vec<String> {
        let mut recs = Vec::new();

        if self.critical_anomalies > 0 {
            recs.push(format!(
                "{} critical anomalies detected. Investigate immediately.",
                self.critical_anomalies
            ));
        }

        if self.high_anomalies > 0 {
            recs.push(format!(
                "{} high severity anomalies detected. Review recent changes.",
                self.high_anomalies
            ));
        }

        for regression in self.regressions.iter().filter(|r| r.is_regression) {
            recs.push(format!(
                "Regression in {} ({}): mean {:+.1}%, P99 {:+.1}%.",
                regression.metric_name,
                regression.regression_severity,
                regression.mean_change_percent,
                regression.p99_change_percent
            ));
        }

        for comparison in &self.baseline_comparisons {
            if matches!(
                comparison.overall_status,
                ComparisonStatus::Degraded | ComparisonStatus::Critical
            ) {
                recs.push(format!(
                    "{} is {} relative to its baseline (mean {:+.1}%).",
                    comparison.metric_name,
                    comparison.overall_status,
                    comparison.mean_change_percent
                ));
            }
        }

        if self.anomaly_rate > DEGRADED_ANOMALY_RATE {
            recs.push(format!(
                "Anomaly rate is {:.1}%. Check whether the baseline still reflects normal behavior.",
                self.anomaly_rate * 100.0
            ));
        }

        recs
    }
}
