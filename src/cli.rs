//! CLI argument parsing for Verdandi

use crate::statistical::DetectionMethod;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for detection results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Point-anomaly detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Standard score against the series mean
    Zscore,
    /// Tukey fences on the interquartile range
    Iqr,
    /// Both, deduplicated by data point
    Combined,
}

impl From<MethodArg> for DetectionMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Zscore => DetectionMethod::ZScore,
            MethodArg::Iqr => DetectionMethod::Iqr,
            MethodArg::Combined => DetectionMethod::Combined,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "verdandi")]
#[command(version)]
#[command(about = "Statistical anomaly and regression detection for metric series", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// TOML file with [detector], [comparator] and [regression] tables
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect point anomalies in a series (exit 1 if any are found)
    Detect {
        /// Comma-separated values or a JSON file
        data: String,

        /// Metric name used in the output
        #[arg(long = "metric", default_value = "metric")]
        metric: String,

        /// Detection method
        #[arg(long = "method", value_enum, default_value = "combined")]
        method: MethodArg,

        /// Override the z-score threshold
        #[arg(long = "threshold", value_name = "Z")]
        threshold: Option<f64>,
    },

    /// Compare before/after samples for a regression (exit 1 on regression)
    Regression {
        /// Samples before the change
        before: String,

        /// Samples after the change
        after: String,

        #[arg(long = "metric", default_value = "metric")]
        metric: String,

        /// Override the minimum percent increase. A value above the
        /// configured critical threshold also raises the critical threshold
        /// to PCT, so CRITICAL then needs at least PCT percent (or d >= 1.2)
        #[arg(long = "threshold", value_name = "PCT")]
        threshold: Option<f64>,

        /// Also run a bootstrap comparison with this many iterations
        #[arg(long = "bootstrap", value_name = "N")]
        bootstrap: Option<usize>,

        /// Seed for the bootstrap resampling
        #[arg(long = "seed", requires = "bootstrap")]
        seed: Option<u64>,
    },

    /// Build a baseline from historical values
    Baseline {
        data: String,

        #[arg(long = "metric", default_value = "metric")]
        metric: String,

        /// Length of the history window in days
        #[arg(long = "period-days", default_value = "7")]
        period_days: u32,

        /// Write the baseline as JSON to this file
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compare current values against a stored baseline
    /// (exit 1 when degraded or critical)
    Compare {
        data: String,

        /// Baseline JSON file written by `baseline --output`
        #[arg(long = "baseline", value_name = "FILE")]
        baseline: PathBuf,
    },

    /// Drift between the first and last of several baselines
    Drift {
        /// Baseline JSON files, oldest first
        #[arg(required = true, num_args = 2..)]
        baselines: Vec<PathBuf>,
    },

    /// Locate level shifts with a sliding window
    ChangePoints {
        data: String,

        /// Window size on each side of a candidate point
        #[arg(long = "window", default_value = "10")]
        window: usize,
    },
}
