// Configuration for statistical point-anomaly detection

use crate::error::{Result, VerdandiError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for [`StatisticalDetector`](super::StatisticalDetector)
///
/// # Example
/// ```
/// use verdandi::statistical::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.z_threshold, 3.0);
/// assert_eq!(config.iqr_multiplier, 1.5);
/// assert_eq!(config.min_sample_size, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// |z| at or above which a point is flagged
    ///
    /// Only the trigger is configurable. Severity banding on |z| is fixed
    /// (5/4/3/2 for CRITICAL/HIGH/MEDIUM/LOW).
    pub z_threshold: f64,

    /// Fence multiplier k for `Q1 - k*IQR` and `Q3 + k*IQR`
    ///
    /// - 1.5 (default): Tukey's inner fences
    /// - 3.0: outer fences, extreme outliers only
    pub iqr_multiplier: f64,

    /// Series shorter than this produce no detections
    pub min_sample_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            iqr_multiplier: 1.5,
            min_sample_size: 10,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(VerdandiError::InvalidConfig(format!(
                "z_threshold must be a positive number, got {}",
                self.z_threshold
            )));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(VerdandiError::InvalidConfig(format!(
                "iqr_multiplier must be a positive number, got {}",
                self.iqr_multiplier
            )));
        }

        if self.min_sample_size < 2 {
            return Err(VerdandiError::InvalidConfig(format!(
                "min_sample_size must be >= 2, got {}",
                self.min_sample_size
            )));
        }

        Ok(())
    }
}

/// Point-anomaly detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    ZScore,
    Iqr,
    /// Union of z-score and IQR detections, deduplicated by data timestamp
    #[default]
    Combined,
}

impl FromStr for DetectionMethod {
    type Err = VerdandiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zscore" | "z-score" => Ok(DetectionMethod::ZScore),
            "iqr" => Ok(DetectionMethod::Iqr),
            "combined" => Ok(DetectionMethod::Combined),
            other => Err(VerdandiError::InvalidConfig(format!(
                "unknown detection method '{}' (expected zscore, iqr or combined)",
                other
            ))),
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::ZScore => f.write_str("zscore"),
            DetectionMethod::Iqr => f.write_str("iqr"),
            DetectionMethod::Combined => f.write_str("combined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_z_threshold() {
        let mut config = DetectorConfig::default();
        config.z_threshold = 0.0;
        assert!(config.validate().is_err());
        config.z_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_iqr_multiplier() {
        let mut config = DetectorConfig::default();
        config.iqr_multiplier = -1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_sample_size() {
        let mut config = DetectorConfig::default();
        config.min_sample_size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("zscore".parse::<DetectionMethod>().unwrap(), DetectionMethod::ZScore);
        assert_eq!("IQR".parse::<DetectionMethod>().unwrap(), DetectionMethod::Iqr);
        assert_eq!(
            "combined".parse::<DetectionMethod>().unwrap(),
            DetectionMethod::Combined
        );
        assert!("median".parse::<DetectionMethod>().is_err());
    }

    #[test]
    fn test_method_display_round_trips() {
        for method in [
            DetectionMethod::ZScore,
            DetectionMethod::Iqr,
            DetectionMethod::Combined,
        ] {
            assert_eq!(method.to_string().parse::<DetectionMethod>().unwrap(), method);
        }
    }
}
