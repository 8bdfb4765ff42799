//! Sample input for the command line
//!
//! A data argument is either a comma-separated list of numbers
//! (`"100,102,98.5"`) or a path to a JSON file holding one of:
//!
//! - an array of numbers: `[100, 102, 98.5]`
//! - an object with values and optional RFC 3339 timestamps:
//!   `{"values": [100, 102], "timestamps": ["2024-01-01T00:00:00Z", ...]}`

use crate::error::{Result, VerdandiError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A metric series with optional per-point timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub values: Vec<f64>,
    pub timestamps: Option<Vec<DateTime<Utc>>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesFile {
    Values(Vec<f64>),
    Object {
        values: Vec<f64>,
        #[serde(default)]
        timestamps: Option<Vec<DateTime<Utc>>>,
    },
}

/// Resolve a data argument: an existing file is read as JSON, anything else
/// is parsed as a comma-separated list
pub fn load_series(arg: &str) -> Result<Series> {
    let path = Path::new(arg);
    if path.is_file() {
        let content = fs::read_to_string(path)?;
        return parse_series_json(&content);
    }

    Ok(Series {
        values: parse_values(arg)?,
        timestamps: None,
    })
}

/// Parse `"1, 2.5,3"` into numbers; empty items are skipped
pub fn parse_values(input: &str) -> Result<Vec<f64>> {
    let values = input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>()
                .map_err(|_| VerdandiError::InvalidData(format!("not a number: '{}'", item)))
                .and_then(check_finite)
        })
        .collect::<Result<Vec<_>>>()?;

    if values.is_empty() {
        return Err(VerdandiError::InvalidData("no values given".to_string()));
    }

    Ok(values)
}

/// Parse the JSON file formats described in the module docs
pub fn parse_series_json(content: &str) -> Result<Series> {
    let series = match serde_json::from_str::<SeriesFile>(content)? {
        SeriesFile::Values(values) => Series {
            values,
            timestamps: None,
        },
        SeriesFile::Object { values, timestamps } => Series { values, timestamps },
    };

    if series.values.is_empty() {
        return Err(VerdandiError::InvalidData("no values given".to_string()));
    }

    if let Some(timestamps) = &series.timestamps {
        if timestamps.len() != series.values.len() {
            return Err(VerdandiError::InvalidData(format!(
                "{} values but {} timestamps",
                series.values.len(),
                timestamps.len()
            )));
        }
    }

    Ok(series)
}

fn check_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VerdandiError::InvalidData(format!(
            "value must be finite, got {}",
            value
        )))
    }
}
