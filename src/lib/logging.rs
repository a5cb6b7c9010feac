//! Formatting helpers for log output and the end-of-run realignment summary.

use std::time::{Duration, Instant};

use log::info;

use crate::metrics::{ProcessingMetrics, RealignmentMetrics, format_count};

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` places.
///
/// # Examples
///
/// ```
/// use fgrealign_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0)
}

/// Formats `part / whole` as a percentage, or `"n/a"` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_fraction(part: u64, whole: u64) -> String {
    if whole == 0 { "n/a".to_string() } else { format_percent(part as f64 / whole as f64, 2) }
}

/// Formats a duration as e.g. `"45s"`, `"2m 15s"` or `"1h 30m"`.
///
/// # Examples
///
/// ```
/// use fgrealign_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, mins, secs) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}

/// Formats a processing rate, falling back to per-minute for slow rates.
///
/// # Examples
///
/// ```
/// use fgrealign_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1), "reads"), "1,000 reads/s");
/// assert_eq!(format_rate(30, Duration::from_secs(60), "regions"), "30.0 regions/min");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration, unit: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} {unit}/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} {unit}/s", format_count(rate as u64))
    } else {
        format!("{:.1} {unit}/min", rate * 60.0)
    }
}

/// Logs the run summary: input, regions, realigned reads and skipped reads.
pub fn log_realignment_summary(metrics: &RealignmentMetrics) {
    info!("Realignment summary:");
    info!("  Reads processed:            {}", format_count(metrics.total_reads));
    info!("  Unmapped reads:             {}", format_count(metrics.unmapped_reads));
    info!("  Target regions:             {}", format_count(metrics.regions_processed));
    info!(
        "  Reads in target regions:    {} ({})",
        format_count(metrics.reads_in_regions),
        format_fraction(metrics.reads_in_regions, metrics.total_reads)
    );
    info!(
        "  Reads realigned:            {} ({})",
        format_count(metrics.total_output()),
        format_fraction(metrics.total_output(), metrics.total_input())
    );
    info!("  Candidate consensuses:      {}", format_count(metrics.candidates_considered));

    if metrics.regions_without_candidates > 0 || metrics.regions_without_reference > 0 {
        info!("  Regions left unchanged:");
        if metrics.regions_without_candidates > 0 {
            info!("    No candidates:            {}", format_count(metrics.regions_without_candidates));
        }
        if metrics.regions_without_reference > 0 {
            info!("    No reference:             {}", format_count(metrics.regions_without_reference));
        }
    }
    if metrics.total_filtered() > 0 {
        info!("  Reads skipped:");
        if metrics.reads_malformed > 0 {
            info!("    Malformed alignment:      {}", format_count(metrics.reads_malformed));
        }
        if metrics.reads_skipped_target_capacity > 0 {
            info!(
                "    Target capacity:          {}",
                format_count(metrics.reads_skipped_target_capacity)
            );
        }
    }
}

/// Times an operation and logs its throughput on completion.
///
/// ```
/// use fgrealign_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Realigning reads", "reads");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    unit: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Starts the timer and logs the start of `operation`.
    #[must_use]
    pub fn new(operation: &str, unit: &str) -> Self {
        info!("{operation} ...");
        Self { operation: operation.to_string(), unit: unit.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs completion with `count` items and the achieved rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        info!(
            "{} completed: {} {} in {} ({})",
            self.operation,
            format_count(count),
            self.unit,
            format_duration(duration),
            format_rate(count, duration, &self.unit)
        );
    }
}
