// Regression verdict for a before/after comparison
//
// The hypothesis-test outputs (t, p, d, df) are either all present or all
// absent, so they live together in one optional `SignificanceTest`.

use crate::anomaly::{deserialize_confidence, validate_confidence, AnomalySeverity};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Outputs of Welch's t-test and Cohen's d for one comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    pub t_statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Cohen's d, positive when the after group is larger
    pub effect_size: f64,
    pub degrees_of_freedom: f64,
}

/// Result of a two-sample before/after comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub detected_at: DateTime<Utc>,
    pub metric_name: String,

    pub before_mean: f64,
    pub after_mean: f64,
    pub before_p99: f64,
    pub after_p99: f64,
    pub before_sample_count: usize,
    pub after_sample_count: usize,
    pub mean_change_percent: f64,
    pub p99_change_percent: f64,

    /// Significant, large enough, upward, and above the percent threshold
    pub is_regression: bool,
    /// INFO unless `is_regression`
    pub regression_severity: AnomalySeverity,

    #[serde(deserialize_with = "deserialize_confidence")]
    pub(super) confidence: f64,

    /// `None` when either sample was empty
    pub test: Option<SignificanceTest>,

    pub description: String,
    pub recommendations: Vec<String>,
}

impl RegressionResult {
    /// Result for a comparison that could not run (an empty sample)
    pub fn insufficient_data(metric_name: impl Into<String>) -> Self {
        Self {
            detected_at: Utc::now(),
            metric_name: metric_name.into(),
            before_mean: 0.0,
            after_mean: 0.0,
            before_p99: 0.0,
            after_p99: 0.0,
            before_sample_count: 0,
            after_sample_count: 0,
            mean_change_percent: 0.0,
            p99_change_percent: 0.0,
            is_regression: false,
            regression_severity: AnomalySeverity::Info,
            confidence: 0.0,
            test: None,
            description: "Insufficient data for comparison".to_string(),
            recommendations: Vec::new(),
        }
    }

    /// Confidence in the verdict, within `[0, 1]`
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Set the confidence, rejecting values outside `[0, 1]`
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        self.confidence = validate_confidence(confidence)?;
        Ok(self)
    }

    pub fn p_value(&self) -> Option<f64> {
        self.test.map(|t| t.p_value)
    }

    pub fn effect_size(&self) -> Option<f64> {
        self.test.map(|t| t.effect_size)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        if self.test.is_none() {
            let _ = writeln!(report, "INSUFFICIENT DATA: {}", self.metric_name);
            let _ = writeln!(report, "\n{}", self.description);
            return report;
        }

        if self.is_regression {
            let _ = writeln!(
                report,
                "REGRESSION DETECTED: {} [{}]",
                self.metric_name, self.regression_severity
            );
        } else {
            let _ = writeln!(report, "NO REGRESSION: {}", self.metric_name);
        }

        let _ = writeln!(report, "\n{}\n", self.description);
        let _ = writeln!(
            report,
            "  mean: {:.2} -> {:.2} ({:+.1}%)",
            self.before_mean, self.after_mean, self.mean_change_percent
        );
        let _ = writeln!(
            report,
            "  p99:  {:.2} -> {:.2} ({:+.1}%)",
            self.before_p99, self.after_p99, self.p99_change_percent
        );
        let _ = writeln!(
            report,
            "  samples: {} before, {} after",
            self.before_sample_count, self.after_sample_count
        );

        if let Some(test) = &self.test {
            let _ = writeln!(
                report,
                "  t={:.3}, df={:.1}, p={:.4}, d={:.2}, confidence={:.2}",
                test.t_statistic,
                test.degrees_of_freedom,
                test.p_value,
                test.effect_size,
                self.confidence
            );
        }

        if !self.recommendations.is_empty() {
            report.push_str("\nRecommendations:\n");
            for rec in &self.recommendations {
                let _ = writeln!(report, "  - {}", rec);
            }
        }

        report
    }

    /// Build a tested result; confidence is clamped into `[0, 1]`
    pub(super) fn tested(mut self, test: SignificanceTest, confidence: f64) -> Self {
        self.test = Some(test);
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }
}
