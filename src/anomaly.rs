//! Anomaly detection result models
//!
//! An [`AnomalyDetection`] is created once per flagged data point and never
//! mutated afterwards. Severity is derived from a deviation magnitude and is
//! ordered by an explicit ordinal ([`AnomalySeverity::rank`]) rather than by
//! declaration order.

use crate::error::{Result, VerdandiError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Type of anomaly detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Value well above the expected level
    Spike,
    /// Value well below the expected level
    Drop,
    TrendChange,
    Outlier,
    PatternBreak,
    Regression,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalyType::Spike => "spike",
            AnomalyType::Drop => "drop",
            AnomalyType::TrendChange => "trend_change",
            AnomalyType::Outlier => "outlier",
            AnomalyType::PatternBreak => "pattern_break",
            AnomalyType::Regression => "regression",
        };
        f.write_str(name)
    }
}

/// Severity of a detected anomaly or regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl AnomalySeverity {
    /// Ordinal ranking: CRITICAL=4 > HIGH=3 > MEDIUM=2 > LOW=1 > INFO=0
    pub fn rank(self) -> u8 {
        match self {
            AnomalySeverity::Critical => 4,
            AnomalySeverity::High => 3,
            AnomalySeverity::Medium => 2,
            AnomalySeverity::Low => 1,
            AnomalySeverity::Info => 0,
        }
    }

    /// Fixed severity banding on |z|, independent of any trigger threshold
    pub fn from_z_score(z_score: f64) -> Self {
        let abs_z = z_score.abs();
        if abs_z >= 5.0 {
            AnomalySeverity::Critical
        } else if abs_z >= 4.0 {
            AnomalySeverity::High
        } else if abs_z >= 3.0 {
            AnomalySeverity::Medium
        } else if abs_z >= 2.0 {
            AnomalySeverity::Low
        } else {
            AnomalySeverity::Info
        }
    }

    /// Severity from the number of IQRs a value lies beyond a fence
    pub fn from_iqr_distance(distance: f64) -> Self {
        if distance >= 3.0 {
            AnomalySeverity::Critical
        } else if distance >= 2.0 {
            AnomalySeverity::High
        } else if distance >= 1.5 {
            AnomalySeverity::Medium
        } else if distance >= 1.0 {
            AnomalySeverity::Low
        } else {
            AnomalySeverity::Info
        }
    }
}

impl PartialOrd for AnomalySeverity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnomalySeverity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnomalySeverity::Critical => "CRITICAL",
            AnomalySeverity::High => "HIGH",
            AnomalySeverity::Medium => "MEDIUM",
            AnomalySeverity::Low => "LOW",
            AnomalySeverity::Info => "INFO",
        };
        f.write_str(name)
    }
}

/// A single flagged data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    /// When the anomaly was flagged
    pub detected_at: DateTime<Utc>,
    /// When the underlying observation occurred
    pub data_timestamp: DateTime<Utc>,
    pub anomaly_type: AnomalyType,
    pub severity: AnomalySeverity,
    pub metric_name: String,
    pub actual_value: f64,
    pub expected_value: f64,
    /// Signed deviation, `actual - expected`
    pub deviation: f64,
    /// `|deviation| / |expected| * 100` (0 when expected is 0)
    pub deviation_percent: f64,
    /// Standard score, present for z-score based detections
    pub z_score: Option<f64>,
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,
    /// Method-specific diagnostics (e.g. IQR fences)
    #[serde(default)]
    pub context: BTreeMap<String, f64>,
    #[serde(default)]
    pub description: String,
}

impl AnomalyDetection {
    /// Create a detection with zero confidence and no z-score
    pub fn new(
        metric_name: impl Into<String>,
        anomaly_type: AnomalyType,
        severity: AnomalySeverity,
        actual_value: f64,
        expected_value: f64,
        data_timestamp: DateTime<Utc>,
    ) -> Self {
        let deviation = actual_value - expected_value;
        let deviation_percent = if expected_value != 0.0 {
            deviation.abs() / expected_value.abs() * 100.0
        } else {
            0.0
        };

        Self {
            detected_at: Utc::now(),
            data_timestamp,
            anomaly_type,
            severity,
            metric_name: metric_name.into(),
            actual_value,
            expected_value,
            deviation,
            deviation_percent,
            z_score: None,
            confidence: 0.0,
            context: BTreeMap::new(),
            description: String::new(),
        }
    }

    pub fn with_z_score(mut self, z_score: f64) -> Self {
        self.z_score = Some(z_score);
        self
    }

    /// Set the detection confidence
    ///
    /// Fails with [`VerdandiError::ConfidenceOutOfRange`] unless the value
    /// lies in `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        self.confidence = validate_confidence(confidence)?;
        Ok(self)
    }

    /// Set a confidence computed by a detector, saturating into `[0, 1]`
    pub(crate) fn with_bounded_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_context(mut self, key: &str, value: f64) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the percentage deviation (used when the caller measures it
    /// against a different reference than `expected_value`)
    pub fn with_deviation_percent(mut self, deviation_percent: f64) -> Self {
        self.deviation_percent = deviation_percent;
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Check that a confidence value lies in `[0, 1]`
pub(crate) fn validate_confidence(confidence: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(VerdandiError::ConfidenceOutOfRange(confidence))
    }
}

pub(crate) fn deserialize_confidence<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    validate_confidence(value).map_err(serde::de::Error::custom)
}

/// Resolve per-point timestamps for a series of `len` values
///
/// Without caller timestamps the series is taken as evenly spaced one second
/// apart, ending now. Supplied timestamps are returned as-is; a length
/// mismatch is logged and the shorter side wins when zipped.
pub(crate) fn resolve_timestamps(
    len: usize,
    timestamps: Option<&[DateTime<Utc>]>,
) -> Vec<DateTime<Utc>> {
    match timestamps {
        Some(ts) => {
            if ts.len() != len {
                tracing::warn!(
                    values = len,
                    timestamps = ts.len(),
                    "timestamp count differs from value count, extra entries ignored"
                );
            }
            ts.to_vec()
        }
        None => {
            let now = Utc::now();
            (0..len)
                .map(|i| now - Duration::seconds((len - 1 - i) as i64))
                .collect()
        }
    }
}
