//! Error types for Verdandi
//!
//! Data-quality conditions (too few samples, zero variance, invalid
//! baselines) are never errors: the detectors return empty or zero-valued
//! results for them. The variants here cover programmer errors when building
//! report models, bad configuration, and I/O around persisted baselines.

use thiserror::Error;

/// Errors produced by the Verdandi library
#[derive(Error, Debug)]
pub enum VerdandiError {
    #[error("confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for Verdandi operations
pub type Result<T> = std::result::Result<T, VerdandiError>;
