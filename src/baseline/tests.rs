// Tests for baseline comparison and drift tracking

use super::*;
use crate::anomaly::{AnomalySeverity, AnomalyType};
use crate::statistical::StatisticalDetector;
use std::collections::HashMap;

/// Baseline over a stable series around 100 (std sqrt(2), fences 96..104)
fn stable_baseline() -> BaselineMetrics {
    let history: Vec<f64> = (0..100).map(|i| 100.0 + ((i % 5) as f64 - 2.0)).collect();
    StatisticalDetector::new().calculate_baseline(&history, "latency", 7)
}

#[test]
fn test_validity_gate() {
    let base = BaselineMetrics::empty("m", 7);
    let too_few = BaselineMetrics {
        sample_count: 5,
        std_dev: 5.0,
        ..base.clone()
    };
    let ok = BaselineMetrics {
        sample_count: 20,
        std_dev: 5.0,
        ..base.clone()
    };
    let flat = BaselineMetrics {
        sample_count: 20,
        std_dev: 0.0,
        ..base
    };
    assert!(!too_few.is_valid());
    assert!(ok.is_valid());
    assert!(!flat.is_valid());
}

#[test]
fn test_compare_empty_batch_is_no_data() {
    let comparison = BaselineComparator::new().compare(&[], &stable_baseline(), None);
    assert_eq!(comparison.overall_status, ComparisonStatus::NoData);
    assert_eq!(comparison.sample_count, 0);
    assert!(!comparison.is_significant);
    assert!(comparison.anomalies_detected.is_empty());
    assert_eq!(comparison.metric_name, "latency");
}

#[test]
fn test_compare_against_flat_baseline_is_critical() {
    let baseline = StatisticalDetector::new().calculate_baseline(&[100.0; 50], "latency", 7);
    let comparison = BaselineComparator::new().compare(&[200.0; 10], &baseline, None);

    assert_eq!(comparison.overall_status, ComparisonStatus::Critical);
    assert!((comparison.mean_change_percent - 100.0).abs() < 1e-9);
    assert!(comparison.is_significant);
    // Flat baseline is invalid: no per-point detections
    assert!(comparison.anomalies_detected.is_empty());
    assert!(comparison.recommendations[0].starts_with("CRITICAL"));
}

#[test]
fn test_compare_unchanged_batch_is_normal() {
    let comparison =
        BaselineComparator::new().compare(&[99.0, 100.0, 101.0, 100.0], &stable_baseline(), None);
    assert_eq!(comparison.overall_status, ComparisonStatus::Normal);
    assert!(!comparison.is_significant);
    assert!(comparison.recommendations.is_empty());
    assert_eq!(comparison.current_median, 100.0);
}

#[test]
fn test_status_changed_band() {
    // Wide baseline (50..150) so a 15% shift of the mean is not a per-point anomaly
    let history: Vec<f64> = (0..100).map(|i| 50.0 + i as f64).collect();
    let baseline = StatisticalDetector::new().calculate_baseline(&history, "m", 7);
    let shifted = vec![baseline.mean * 1.15; 10];

    let comparison = BaselineComparator::new().compare(&shifted, &baseline, None);
    assert!(comparison.anomalies_detected.is_empty());
    assert!((comparison.mean_change_percent - 15.0).abs() < 1e-9);
    assert_eq!(comparison.overall_status, ComparisonStatus::Changed);
    assert!(comparison.is_significant);
}

#[test]
fn test_status_degraded_by_anomaly_rate() {
    let baseline = stable_baseline();
    // 2 of 10 points far out: mean moves only ~3.6%, anomaly rate 20%
    let mut batch = vec![100.0; 8];
    batch.extend([118.0, 118.0]);

    let comparison = BaselineComparator::new().compare(&batch, &baseline, None);
    assert_eq!(comparison.anomalies_detected.len(), 2);
    assert_eq!(comparison.overall_status, ComparisonStatus::Degraded);
    assert!(comparison.is_significant);
}

#[test]
fn test_status_critical_by_anomaly_rate() {
    let baseline = stable_baseline();
    let mut batch = vec![100.0; 7];
    batch.extend([108.0, 108.0, 108.0]);

    let comparison = BaselineComparator::new().compare(&batch, &baseline, None);
    assert_eq!(comparison.anomalies_detected.len(), 3);
    assert!(comparison.mean_change_percent < 10.0);
    assert_eq!(comparison.overall_status, ComparisonStatus::Critical);
}

#[test]
fn test_comparator_anomaly_fields() {
    let baseline = stable_baseline();
    let comparison = BaselineComparator::new().compare(&[100.0, 160.0], &baseline, None);

    assert_eq!(comparison.anomalies_detected.len(), 1);
    let a = &comparison.anomalies_detected[0];
    assert_eq!(a.anomaly_type, AnomalyType::Spike);
    // +60% change against the baseline mean
    assert_eq!(a.severity, AnomalySeverity::Critical);
    assert!((a.deviation_percent - 60.0).abs() < 1e-9);
    assert!(a.confidence() <= 0.99);
    assert!(a.z_score.unwrap() > 2.0);
}

#[test]
fn test_recommendations_for_improvement() {
    let baseline = stable_baseline();
    let comparison = BaselineComparator::new().compare(&[60.0; 10], &baseline, None);
    assert!(comparison
        .recommendations
        .iter()
        .any(|r| r.starts_with("Mean latency decreased by 40.0%")));
}

#[test]
fn test_recommendations_for_tail_regression() {
    let baseline = stable_baseline();
    let comparison = BaselineComparator::new().compare(&[200.0; 10], &baseline, None);
    let recs = &comparison.recommendations;
    assert!(recs.iter().any(|r| r.starts_with("CRITICAL")));
    assert!(recs.iter().any(|r| r.starts_with("Mean latency increased")));
    assert!(recs.iter().any(|r| r.starts_with("P99 latency increased")));
    assert!(recs.iter().any(|r| r.starts_with("10 critical anomalies")));
}

#[test]
fn test_compare_multiple_matches_by_name() {
    let comparator = BaselineComparator::new();
    let mut baselines = HashMap::new();
    baselines.insert("latency".to_string(), stable_baseline());

    let mut current = HashMap::new();
    current.insert("latency".to_string(), vec![100.0; 5]);
    current.insert("throughput".to_string(), vec![1.0; 5]);

    let results = comparator.compare_multiple(&current, &baselines);
    assert_eq!(results.len(), 1);
    assert_eq!(results["latency"].overall_status, ComparisonStatus::Normal);
}

#[test]
fn test_deviation_score() {
    let comparator = BaselineComparator::new();
    let baseline = stable_baseline();

    assert_eq!(comparator.calculate_deviation_score(baseline.mean, &baseline), 0.0);

    // Inside the fences: z component only
    let inside = comparator.calculate_deviation_score(102.0, &baseline);
    assert!((inside - 0.6 * (2.0 / baseline.std_dev)).abs() < 1e-12);

    // Beyond the upper fence (104): (110 - 104) / 2 = 3 IQRs
    let outside = comparator.calculate_deviation_score(110.0, &baseline);
    let expected = 0.6 * (10.0 / baseline.std_dev) + 0.4 * 3.0;
    assert!((outside - expected).abs() < 1e-12);
}

#[test]
fn test_deviation_score_invalid_baseline_is_zero() {
    let comparator = BaselineComparator::new();
    let baseline = BaselineMetrics::empty("m", 7);
    assert_eq!(comparator.calculate_deviation_score(1e6, &baseline), 0.0);
}

#[test]
fn test_is_within_baseline() {
    let comparator = BaselineComparator::new();
    let baseline = stable_baseline();

    assert!(comparator.is_within_baseline(100.0, &baseline, 1.0));
    // |z| = 3 / 1.414 > 2.0
    assert!(!comparator.is_within_baseline(103.0, &baseline, 1.0));
    // Loosened tolerance accepts it: z limit 4, IQR band 95..105
    assert!(comparator.is_within_baseline(103.0, &baseline, 2.0));
    // Inside the z limit but outside the IQR band 97..103
    let wide_std = BaselineMetrics {
        std_dev: 10.0,
        ..baseline
    };
    assert!(!comparator.is_within_baseline(104.0, &wide_std, 1.0));
}

#[test]
fn test_is_within_baseline_invalid_assumes_ok() {
    let comparator = BaselineComparator::new();
    let baseline = BaselineMetrics::empty("m", 7);
    assert!(comparator.is_within_baseline(1e9, &baseline, 1.0));
}

#[test]
fn test_drift_requires_two_baselines() {
    let comparator = BaselineComparator::new();
    assert_eq!(comparator.track_baseline_drift(&[]), BaselineDrift::default());
    let drift = comparator.track_baseline_drift(&[stable_baseline()]);
    assert!(!drift.is_drifting);
    assert_eq!(drift.mean_drift_percent, 0.0);
}

#[test]
fn test_drift_uses_first_and_last_only() {
    let comparator = BaselineComparator::new();
    let detector = StatisticalDetector::new();
    let week1 = stable_baseline();
    let spike_week: Vec<f64> = (0..100).map(|i| 300.0 + (i % 5) as f64).collect();
    let week2 = detector.calculate_baseline(&spike_week, "latency", 7);
    let week3 = stable_baseline();

    // Oscillation in the middle is ignored
    let drift = comparator.track_baseline_drift(&[week1.clone(), week2.clone(), week3]);
    assert!(drift.mean_drift_percent.abs() < 1e-9);
    assert!(!drift.is_drifting);

    let drift = comparator.track_baseline_drift(&[week1, week2]);
    assert!(drift.mean_drift_percent > 100.0);
    assert!(drift.is_drifting);
}

#[test]
fn test_comparison_serializes_status_snake_case() {
    let comparison = BaselineComparator::new().compare(&[], &stable_baseline(), None);
    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["overall_status"], "no_data");
}

/// Collects formatted log lines for assertions
#[derive(Clone, Default)]
struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_invalid_baseline_comparison_logs_warning() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();

    let baseline = StatisticalDetector::new().calculate_baseline(&[100.0; 50], "latency", 7);
    let comparison = tracing::subscriber::with_default(subscriber, || {
        BaselineComparator::new().compare(&[200.0; 10], &baseline, None)
    });

    assert!(comparison.anomalies_detected.is_empty());
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"));
    assert!(output.contains("baseline is not valid for per-point comparison"));
}
