// Point anomaly detection over a single metric series
//
// Three complementary views of "unusual":
// - z-score: distance from the mean in population standard deviations
// - IQR fences: Tukey's rule, robust to the outliers it is looking for
// - change points: sliding-window comparison for level shifts
//
// Detection against a stored `BaselineMetrics` reuses the same z-score and
// fence rules but takes mean, spread and fences from the baseline instead of
// recomputing them from the batch.

mod config;
mod detector;

pub use config::{DetectionMethod, DetectorConfig};
pub use detector::StatisticalDetector;
