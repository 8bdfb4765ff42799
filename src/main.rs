use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use verdandi::anomaly::AnomalyDetection;
use verdandi::baseline::{store, BaselineComparison, BaselineDrift, BaselineMetrics, ComparisonStatus};
use verdandi::cli::{Cli, Command, OutputFormat};
use verdandi::config::VerdandiConfig;
use verdandi::data::{self, Series};
use verdandi::report::AnomalyReport;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_series(arg: &str) -> Result<Series> {
    data::load_series(arg).with_context(|| format!("Failed to read data from '{}'", arg))
}

fn load_baseline(path: &Path) -> Result<BaselineMetrics> {
    store::load_baseline(path)
        .with_context(|| format!("Failed to load baseline {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_anomaly(anomaly: &AnomalyDetection) {
    println!(
        "  [{}] {} {} = {:.3} (expected {:.3}, {:+.1}%) at {}",
        anomaly.severity,
        anomaly.anomaly_type,
        anomaly.metric_name,
        anomaly.actual_value,
        anomaly.expected_value,
        if anomaly.deviation < 0.0 {
            -anomaly.deviation_percent
        } else {
            anomaly.deviation_percent
        },
        anomaly.data_timestamp.to_rfc3339()
    );
    if !anomaly.description.is_empty() {
        println!("      {}", anomaly.description);
    }
}

fn print_report(report: &AnomalyReport) {
    println!("=== Anomaly Report ===");
    println!(
        "Data points: {}  Anomalies: {} (critical {}, high {}, medium {}, low {})",
        report.data_points_analyzed,
        report.total_anomalies,
        report.critical_anomalies,
        report.high_anomalies,
        report.medium_anomalies,
        report.low_anomalies
    );
    println!(
        "Anomaly rate: {:.2}%  Health: {}",
        report.anomaly_rate * 100.0,
        report.health_status
    );

    if !report.anomalies.is_empty() {
        println!();
        for anomaly in &report.anomalies {
            print_anomaly(anomaly);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &report.recommendations {
            println!("  - {}", rec);
        }
    }
}

fn print_baseline(baseline: &BaselineMetrics) {
    println!("=== Baseline: {} ===", baseline.metric_name);
    println!(
        "Samples: {} over {} days (valid: {})",
        baseline.sample_count,
        baseline.baseline_period_days,
        baseline.is_valid()
    );
    println!(
        "mean {:.3}  median {:.3}  std {:.3}  min {:.3}  max {:.3}",
        baseline.mean, baseline.median, baseline.std_dev, baseline.min_value, baseline.max_value
    );
    println!(
        "p5 {:.3}  p25 {:.3}  p75 {:.3}  p95 {:.3}  p99 {:.3}  IQR {:.3}",
        baseline.p5, baseline.p25, baseline.p75, baseline.p95, baseline.p99, baseline.iqr
    );
}

fn print_comparison(comparison: &BaselineComparison) {
    println!(
        "=== Baseline Comparison: {} [{}] ===",
        comparison.metric_name, comparison.overall_status
    );
    println!(
        "mean {:.3} ({:+.1}%)  median {:.3} ({:+.1}%)  p99 {:.3} ({:+.1}%)",
        comparison.current_mean,
        comparison.mean_change_percent,
        comparison.current_median,
        comparison.median_change_percent,
        comparison.current_p99,
        comparison.p99_change_percent
    );
    println!(
        "Samples: {}  Anomalies: {}  Significant: {}",
        comparison.sample_count,
        comparison.anomalies_detected.len(),
        comparison.is_significant
    );
    for anomaly in &comparison.anomalies_detected {
        print_anomaly(anomaly);
    }
    if !comparison.recommendations.is_empty() {
        println!("\nRecommendations:");
        for rec in &comparison.recommendations {
            println!("  - {}", rec);
        }
    }
}

fn print_drift(drift: &BaselineDrift) {
    println!("=== Baseline Drift ===");
    println!(
        "mean {:+.1}%  std {:+.1}%  p99 {:+.1}%",
        drift.mean_drift_percent, drift.std_drift_percent, drift.p99_drift_percent
    );
    println!("Drifting: {}", drift.is_drifting);
}

/// Execute a subcommand; `true` means a finding that should fail the run
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => VerdandiConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => VerdandiConfig::default(),
    };
    let format = cli.format;

    match cli.command {
        Command::Detect {
            data,
            metric,
            method,
            threshold,
        } => {
            let series = load_series(&data)?;
            let mut detector_config = config.detector.clone();
            if let Some(z) = threshold {
                detector_config.z_threshold = z;
            }
            let detector = verdandi::statistical::StatisticalDetector::with_config(detector_config)?;
            let anomalies = detector.detect(
                &series.values,
                &metric,
                series.timestamps.as_deref(),
                method.into(),
            );

            let (start, end) = match series.timestamps.as_deref() {
                Some([first, .., last]) => (*first, *last),
                Some([only]) => (*only, *only),
                _ => {
                    let now = Utc::now();
                    let span = series.values.len().saturating_sub(1) as i64;
                    (now - Duration::seconds(span), now)
                }
            };

            let found = !anomalies.is_empty();
            let mut report = AnomalyReport::new(start, end);
            report.add_anomalies(series.values.len(), anomalies);

            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_report(&report),
            }
            Ok(found)
        }

        Command::Regression {
            before,
            after,
            metric,
            threshold,
            bootstrap,
            seed,
        } => {
            let before = load_series(&before)?;
            let after = load_series(&after)?;
            let mut regression_config = config.regression.clone();
            if let Some(pct) = threshold {
                regression_config.regression_threshold_percent = pct;
                if regression_config.critical_threshold_percent < pct {
                    tracing::warn!(
                        threshold = pct,
                        critical = regression_config.critical_threshold_percent,
                        "regression threshold above critical threshold, raising critical to match"
                    );
                    regression_config.critical_threshold_percent = pct;
                }
            }
            let detector = verdandi::regression::RegressionDetector::with_config(regression_config)?;
            let result = detector.detect(&before.values, &after.values, &metric);

            let bootstrap = bootstrap.and_then(|iterations| match seed {
                Some(seed) => detector.bootstrap_comparison_with_rng(
                    &before.values,
                    &after.values,
                    iterations,
                    &mut StdRng::seed_from_u64(seed),
                ),
                None => detector.bootstrap_comparison(&before.values, &after.values, iterations),
            });

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "result": result,
                    "bootstrap": bootstrap,
                }))?,
                OutputFormat::Text => {
                    print!("{}", result.to_report_string());
                    if let Some(b) = &bootstrap {
                        println!("\nBootstrap ({} iterations):", b.iterations);
                        println!("  mean difference: {:.3}", b.mean_difference);
                        println!("  95% CI: [{:.3}, {:.3}]", b.ci_lower_95, b.ci_upper_95);
                        println!("  99% CI: [{:.3}, {:.3}]", b.ci_lower_99, b.ci_upper_99);
                        println!("  P(regression): {:.3}", b.probability_regression);
                    }
                }
            }
            Ok(result.is_regression)
        }

        Command::Baseline {
            data,
            metric,
            period_days,
            output,
        } => {
            let series = load_series(&data)?;
            let detector = config.statistical_detector()?;
            let baseline = detector.calculate_baseline(&series.values, &metric, period_days);

            if let Some(path) = &output {
                store::save_baseline(path, &baseline)
                    .with_context(|| format!("Failed to write baseline {}", path.display()))?;
            }

            match format {
                OutputFormat::Json => print_json(&baseline)?,
                OutputFormat::Text => {
                    print_baseline(&baseline);
                    if let Some(path) = &output {
                        println!("Saved to {}", path.display());
                    }
                }
            }
            Ok(false)
        }

        Command::Compare { data, baseline } => {
            let series = load_series(&data)?;
            let baseline = load_baseline(&baseline)?;
            let comparator = config.baseline_comparator()?;
            let comparison =
                comparator.compare(&series.values, &baseline, series.timestamps.as_deref());

            match format {
                OutputFormat::Json => print_json(&comparison)?,
                OutputFormat::Text => print_comparison(&comparison),
            }
            Ok(matches!(
                comparison.overall_status,
                ComparisonStatus::Degraded | ComparisonStatus::Critical
            ))
        }

        Command::Drift { baselines } => {
            let history = baselines
                .iter()
                .map(|path| load_baseline(path))
                .collect::<Result<Vec<_>>>()?;
            let drift = config.baseline_comparator()?.track_baseline_drift(&history);

            match format {
                OutputFormat::Json => print_json(&drift)?,
                OutputFormat::Text => print_drift(&drift),
            }
            Ok(false)
        }

        Command::ChangePoints { data, window } => {
            let series = load_series(&data)?;
            let detector = config.statistical_detector()?;
            let points = detector.find_change_points(&series.values, window);

            match format {
                OutputFormat::Json => {
                    let points: Vec<_> = points
                        .iter()
                        .map(|(index, magnitude)| {
                            serde_json::json!({ "index": index, "magnitude": magnitude })
                        })
                        .collect();
                    print_json(&points)?
                }
                OutputFormat::Text => {
                    println!("=== Change Points (window {}) ===", window);
                    if points.is_empty() {
                        println!("No change points found");
                    }
                    for (index, magnitude) in &points {
                        println!("  index {}: magnitude {:.3}", index, magnitude);
                    }
                }
            }
            Ok(false)
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    if run(args)? {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
