//! Verdandi - statistical anomaly and regression detection for metric series
//!
//! This library flags unusual points in a single series (z-score, IQR
//! fences, change points), compares new batches against frozen baselines,
//! and decides whether a before/after change is a significant regression
//! (Welch's t-test, Cohen's d, bootstrap).
//!
//! All detectors are immutable configuration holders. Calls are pure
//! computations over in-memory slices; "not enough data" yields empty or
//! zero-valued results rather than errors.

pub mod anomaly;
pub mod baseline;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod regression;
pub mod report;
pub mod statistical;
pub mod stats;

pub use anomaly::{AnomalyDetection, AnomalySeverity, AnomalyType};
pub use baseline::{BaselineComparator, BaselineComparison, BaselineMetrics, ComparisonStatus};
pub use error::{Result, VerdandiError};
pub use regression::{RegressionDetector, RegressionResult};
pub use report::{AnomalyReport, HealthStatus};
pub use statistical::{DetectionMethod, StatisticalDetector};
