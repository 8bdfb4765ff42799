//! Comprehensive property-based tests
//!
//! Covers the invariants every detector must hold for arbitrary input:
//! 1. Percentile monotonicity
//! 2. Zero-variance safety
//! 3. Combined detection keeps every unique z-score/IQR data point
//! 4. Confidence always within [0, 1]
//! 5. Regressions only in the upward direction
//! 6. Exact JSON round trip of baselines
//! 7. Data parsing never panics

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use verdandi::baseline::BaselineMetrics;
use verdandi::regression::{t_distribution_p_value, welch_t_test, RegressionDetector};
use verdandi::statistical::{DetectionMethod, StatisticalDetector};
use verdandi::stats;

fn integer_series(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1_000_000i32..1_000_000, len)
        .prop_map(|v| v.into_iter().map(f64::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_percentile_monotonic(
        values in integer_series(1..100),
        p1 in 0.0f64..=100.0,
        p2 in 0.0f64..=100.0,
    ) {
        let sorted = stats::sorted(&values);
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let a = stats::percentile(&sorted, lo);
        let b = stats::percentile(&sorted, hi);
        prop_assert!(a <= b, "p{}={} > p{}={}", lo, a, hi, b);
        prop_assert!(a >= sorted[0] && b <= sorted[sorted.len() - 1]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_constant_series_has_no_anomalies(c in -1e9f64..1e9, n in 10usize..100) {
        let values = vec![c; n];
        let detector = StatisticalDetector::new();
        prop_assert!(detector.detect_zscore(&values, "m", None).is_empty());
        prop_assert!(detector.detect_iqr(&values, "m", None).is_empty());
        prop_assert!(detector
            .detect(&values, "m", None, DetectionMethod::Combined)
            .is_empty());
        prop_assert!(detector.find_change_points(&values, 3).is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_combined_contains_unique_detections(values in integer_series(10..80)) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..values.len())
            .map(|i| start + Duration::seconds(i as i64))
            .collect();
        let detector = StatisticalDetector::new();

        let combined = detector.detect(&values, "m", Some(&timestamps), DetectionMethod::Combined);
        let zscore = detector.detect_zscore(&values, "m", Some(&timestamps));
        let iqr = detector.detect_iqr(&values, "m", Some(&timestamps));

        let combined_ts: HashSet<_> = combined.iter().map(|a| a.data_timestamp).collect();
        prop_assert_eq!(combined_ts.len(), combined.len());
        for a in zscore.iter().chain(&iqr) {
            prop_assert!(combined_ts.contains(&a.data_timestamp));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_confidence_is_bounded(
        values in integer_series(10..60),
        history in integer_series(10..60),
    ) {
        let detector = StatisticalDetector::new();
        let baseline = detector.calculate_baseline(&history, "m", 7);

        let detections = detector
            .detect(&values, "m", None, DetectionMethod::Combined)
            .into_iter()
            .chain(detector.detect_with_baseline(&values, &baseline, None));
        for a in detections {
            prop_assert!((0.0..=1.0).contains(&a.confidence()));
        }

        let result = RegressionDetector::new().detect(&history, &values, "m");
        prop_assert!((0.0..=1.0).contains(&result.confidence()));
    }

    #[test]
    fn prop_no_regression_when_mean_does_not_rise(
        before in integer_series(2..60),
        delta in 0u32..1000,
    ) {
        let after: Vec<f64> = before.iter().map(|v| v - f64::from(delta)).collect();
        let result = RegressionDetector::new().detect(&before, &after, "m");
        prop_assert!(!result.is_regression);
    }

    #[test]
    fn prop_p_value_bounded_and_monotonic(t in 0.0f64..50.0, dt in 0.0f64..5.0, df in 1.0f64..200.0) {
        let p1 = t_distribution_p_value(t, df);
        let p2 = t_distribution_p_value(t + dt, df);
        prop_assert!((0.0..=1.0).contains(&p1));
        prop_assert!(p2 <= p1 + 1e-12);
    }

    #[test]
    fn prop_welch_p_value_bounded(
        m1 in -1e3f64..1e3,
        m2 in -1e3f64..1e3,
        s1 in 0.0f64..100.0,
        s2 in 0.0f64..100.0,
        n1 in 0usize..500,
        n2 in 0usize..500,
    ) {
        let test = welch_t_test(m1, s1, n1, m2, s2, n2);
        prop_assert!((0.0..=1.0).contains(&test.p_value));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_baseline_json_round_trip(values in prop::collection::vec(-1e12f64..1e12, 0..50)) {
        let baseline = StatisticalDetector::new().calculate_baseline(&values, "metric.name", 30);
        let json = serde_json::to_string(&baseline).unwrap();
        let back: BaselineMetrics = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, baseline);
    }

    #[test]
    fn prop_parse_values_never_panics(input in "\\PC*") {
        let _ = verdandi::data::parse_values(&input);
    }
}
