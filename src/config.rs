//! TOML configuration for all three detectors
//!
//! Every table is optional; missing tables and keys take their defaults.
//!
//! ```toml
//! [detector]
//! z_threshold = 2.5
//!
//! [comparator]
//! critical_change_percent = 40.0
//!
//! [regression]
//! significance_level = 0.01
//! ```

use crate::baseline::{BaselineComparator, ComparatorConfig};
use crate::error::Result;
use crate::regression::{RegressionConfig, RegressionDetector};
use crate::statistical::{DetectorConfig, StatisticalDetector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Combined configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdandiConfig {
    pub detector: DetectorConfig,
    pub comparator: ComparatorConfig,
    pub regression: RegressionConfig,
}

impl VerdandiConfig {
    /// Load and validate a configuration file
    ///
    /// # Example
    /// ```no_run
    /// use verdandi::config::VerdandiConfig;
    ///
    /// # fn main() -> verdandi::error::Result<()> {
    /// let config = VerdandiConfig::from_file("verdandi.toml")?;
    /// let detector = config.statistical_detector()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.comparator.validate()?;
        self.regression.validate()
    }

    pub fn statistical_detector(&self) -> Result<StatisticalDetector> {
        StatisticalDetector::with_config(self.detector.clone())
    }

    pub fn baseline_comparator(&self) -> Result<BaselineComparator> {
        BaselineComparator::with_config(self.comparator.clone())
    }

    pub fn regression_detector(&self) -> Result<RegressionDetector> {
        RegressionDetector::with_config(self.regression.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerdandiError;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = VerdandiConfig::from_toml_str("").unwrap();
        assert_eq!(config, VerdandiConfig::default());
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let config = VerdandiConfig::from_toml_str(
            r#"
            [detector]
            z_threshold = 2.5

            [regression]
            significance_level = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.z_threshold, 2.5);
        assert_eq!(config.detector.iqr_multiplier, 1.5);
        assert_eq!(config.regression.significance_level, 0.01);
        assert_eq!(config.regression.min_effect_size, 0.2);
        assert_eq!(config.comparator, ComparatorConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = VerdandiConfig::from_toml_str(
            r#"
            [detector]
            z_threshold = -1.0
            "#,
        );
        assert!(matches!(result, Err(VerdandiError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = VerdandiConfig::from_toml_str("[detector\nz_threshold = ");
        assert!(matches!(result, Err(VerdandiError::Toml(_))));
    }

    #[test]
    fn test_from_file_builds_detectors() {
        use std::io::Write;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[comparator]\nz_threshold = 3.0").unwrap();

        let config = VerdandiConfig::from_file(file.path()).unwrap();
        let comparator = config.baseline_comparator().unwrap();
        assert_eq!(comparator.config().z_threshold, 3.0);
        assert!(config.statistical_detector().is_ok());
        assert!(config.regression_detector().is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = VerdandiConfig::from_file("/nonexistent/verdandi.toml");
        assert!(matches!(result, Err(VerdandiError::Io(_))));
    }
}
