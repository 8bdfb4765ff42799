//! JSON persistence for baselines
//!
//! Every field round-trips exactly: floats are written with enough digits
//! and parsed with `serde_json`'s `float_roundtrip` mode.

use crate::baseline::BaselineMetrics;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write a single baseline as pretty-printed JSON
pub fn save_baseline(path: &Path, baseline: &BaselineMetrics) -> Result<()> {
    let json = serde_json::to_string_pretty(baseline)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), metric = %baseline.metric_name, "baseline saved");
    Ok(())
}

/// Read a baseline previously written by [`save_baseline`]
pub fn load_baseline(path: &Path) -> Result<BaselineMetrics> {
    let contents = fs::read_to_string(path)?;
    let baseline = serde_json::from_str(&contents)?;
    Ok(baseline)
}

/// Write a chronological series of baselines (oldest first)
pub fn save_history(path: &Path, history: &[BaselineMetrics]) -> Result<()> {
    let json = serde_json::to_string_pretty(history)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a series written by [`save_history`]
pub fn load_history(path: &Path) -> Result<Vec<BaselineMetrics>> {
    let contents = fs::read_to_string(path)?;
    let history = serde_json::from_str(&contents)?;
    Ok(history)
}
