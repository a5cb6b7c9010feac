#![deny(unsafe_code)]

//! Structured metric types and TSV writer for fgrealign operations.
//!
//! This crate provides:
//! - [`Metric`] and [`ProcessingMetrics`] traits for extensible metric types
//! - [`realign`] metrics summarising an indel realignment run
//! - [`writer`] module for TSV file output

pub mod realign;
pub mod writer;

use serde::{Deserialize, Serialize};

/// Formats a count with thousands separators.
///
/// # Example
/// ```
/// use fgrealign_metrics::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(123), "123");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type, used in error messages.
    fn metric_name() -> &'static str;
}

/// Common interface for metrics that track processing pipeline counts.
pub trait ProcessingMetrics {
    /// Total number of input reads processed.
    fn total_input(&self) -> u64;

    /// Total number of reads whose alignment was changed.
    fn total_output(&self) -> u64;

    /// Total number of reads skipped because of malformed or unusable input.
    fn total_filtered(&self) -> u64;

    /// Fraction of input reads that were changed, as a percentage.
    fn efficiency(&self) -> f64 {
        if self.total_input() == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "read counts never exceed 2^53")]
            let result = self.total_output() as f64 / self.total_input() as f64 * 100.0;
            result
        }
    }
}

pub use realign::{RealignmentMetrics, TargetRegionMetric};
pub use writer::write_metrics;
