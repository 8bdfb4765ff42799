// Configuration for baseline comparison

use crate::error::{Result, VerdandiError};
use serde::{Deserialize, Serialize};

/// Thresholds used by [`BaselineComparator`](super::BaselineComparator)
///
/// Percent thresholds apply to the absolute percent change of the batch mean
/// or P99 relative to the baseline.
///
/// # Example
/// ```
/// use verdandi::baseline::ComparatorConfig;
///
/// let config = ComparatorConfig::default();
/// assert_eq!(config.significance_threshold, 10.0);
/// assert_eq!(config.critical_change_percent, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Percent change treated as significant ("changed")
    pub significance_threshold: f64,

    /// |z| against the baseline at which a point is flagged
    pub z_threshold: f64,

    /// Percent change treated as critical
    pub critical_change_percent: f64,

    /// Percent change treated as degraded
    pub high_change_percent: f64,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 10.0,
            z_threshold: 2.0,
            critical_change_percent: 50.0,
            high_change_percent: 25.0,
        }
    }
}

impl ComparatorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("significance_threshold", self.significance_threshold),
            ("z_threshold", self.z_threshold),
            ("critical_change_percent", self.critical_change_percent),
            ("high_change_percent", self.high_change_percent),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(VerdandiError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.high_change_percent > self.critical_change_percent {
            return Err(VerdandiError::InvalidConfig(format!(
                "high_change_percent ({}) must not exceed critical_change_percent ({})",
                self.high_change_percent, self.critical_change_percent
            )));
        }

        Ok(())
    }
}
