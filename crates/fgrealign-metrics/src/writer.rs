//! Utilities for writing metrics files.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;
use std::path::Path;

use super::Metric;

/// Write metrics to a TSV file.
///
/// # Arguments
/// * `path` - Path to the output TSV file
/// * `metrics` - The metrics to write
/// * `description` - Human-readable description of the metrics for error messages
///
/// # Errors
/// Returns an error if the file cannot be created or written to
///
/// # Example
/// ```no_run
/// use fgrealign_metrics::writer::write_metrics;
/// use fgrealign_metrics::RealignmentMetrics;
/// use std::path::Path;
///
/// let metrics = vec![RealignmentMetrics::default()];
/// write_metrics(Path::new("realign_metrics.txt"), &metrics, "realignment").unwrap();
/// ```
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path_ref.display()))
}

/// Write metrics implementing [`Metric`], naming them by [`Metric::metric_name`] in errors.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
pub fn write_metrics_auto<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_metrics(path, metrics, T::metric_name())
}
