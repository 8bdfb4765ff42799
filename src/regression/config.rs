// Configuration for before/after regression detection
//
// A regression must clear four bars at once: statistical significance
// (p-value), practical significance (Cohen's d), direction (the metric went
// up), and a minimum percent increase in the mean.

use crate::error::{Result, VerdandiError};
use serde::{Deserialize, Serialize};

/// Configuration for [`RegressionDetector`](super::RegressionDetector)
///
/// # Example
/// ```
/// use verdandi::regression::RegressionConfig;
///
/// let config = RegressionConfig::default();
/// assert_eq!(config.significance_level, 0.05); // 95% confidence
/// assert_eq!(config.min_effect_size, 0.2);     // Cohen's "small" effect
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Statistical significance level (alpha) for Welch's t-test
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: 99% confidence level, fewer false positives
    /// - 0.10: 90% confidence level, catches more borderline changes
    pub significance_level: f64,

    /// Minimum |Cohen's d| for a change to matter in practice
    ///
    /// Cohen's conventions: 0.2 small, 0.5 medium, 0.8 large.
    /// With large samples even tiny shifts become statistically significant;
    /// this keeps them from being reported as regressions.
    pub min_effect_size: f64,

    /// Minimum percent increase of the mean to report a regression
    pub regression_threshold_percent: f64,

    /// Percent change at which a regression is CRITICAL
    ///
    /// Half of this value is the HIGH band.
    pub critical_threshold_percent: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_effect_size: 0.2,
            regression_threshold_percent: 10.0,
            critical_threshold_percent: 50.0,
        }
    }
}

impl RegressionConfig {
    /// Create a strict configuration (fewer false positives, more false negatives)
    ///
    /// Use when a reported regression should block a release.
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            min_effect_size: 0.5,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (more false positives, fewer false negatives)
    ///
    /// Use when you want to catch potential regressions early.
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
            min_effect_size: 0.1,
            regression_threshold_percent: 5.0,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(VerdandiError::InvalidConfig(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }

        if !self.min_effect_size.is_finite() || self.min_effect_size < 0.0 {
            return Err(VerdandiError::InvalidConfig(format!(
                "min_effect_size must be non-negative, got {}",
                self.min_effect_size
            )));
        }

        if !self.regression_threshold_percent.is_finite() || self.regression_threshold_percent <= 0.0
        {
            return Err(VerdandiError::InvalidConfig(format!(
                "regression_threshold_percent must be positive, got {}",
                self.regression_threshold_percent
            )));
        }

        if !self.critical_threshold_percent.is_finite()
            || self.critical_threshold_percent < self.regression_threshold_percent
        {
            return Err(VerdandiError::InvalidConfig(format!(
                "critical_threshold_percent ({}) must be >= regression_threshold_percent ({})",
                self.critical_threshold_percent, self.regression_threshold_percent
            )));
        }

        Ok(())
    }
}
