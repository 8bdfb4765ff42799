// Baselines: frozen statistical snapshots of normal behavior, and comparison
// of new batches against them
//
// A `BaselineMetrics` is produced once by
// `StatisticalDetector::calculate_baseline` and never mutated. Drift is
// tracked by keeping an ordered sequence of snapshots, not by updating one.

mod comparator;
mod config;
mod metrics;
pub mod store;

pub use comparator::BaselineComparator;
pub use config::ComparatorConfig;
pub use metrics::{BaselineComparison, BaselineDrift, BaselineMetrics, ComparisonStatus};

#[cfg(test)]
mod tests;
