//! Metrics for indel realignment.
//!
//! [`RealignmentMetrics`] is the run-level diagnostic summary; [`TargetRegionMetric`] is written
//! once per target region by the `targets` command and, optionally, by `realign`.

use serde::{Deserialize, Serialize};

use crate::{Metric, ProcessingMetrics};

/// Summary counts for a realignment run.
///
/// Every recoverable anomaly (malformed alignments, regions without candidates or reference) is
/// aggregated here rather than raised as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealignmentMetrics {
    /// Total reads seen by the engine
    pub total_reads: u64,

    /// Reads that were unmapped and passed straight through
    pub unmapped_reads: u64,

    /// Mapped reads skipped because of an inconsistent CIGAR or a missing start position
    pub reads_malformed: u64,

    /// Reads that could not join a target region without breaking region disjointness or width
    pub reads_skipped_target_capacity: u64,

    /// Number of target regions processed
    pub regions_processed: u64,

    /// Regions for which no candidate consensus could be generated
    pub regions_without_candidates: u64,

    /// Regions whose reference window could not be obtained
    pub regions_without_reference: u64,

    /// Reads that were members of some target region
    pub reads_in_regions: u64,

    /// Reads whose alignment was rewritten
    pub reads_realigned: u64,

    /// Total candidate consensuses scored across all regions
    pub candidates_considered: u64,
}

impl RealignmentMetrics {
    /// Creates a new metrics struct with all counts set to zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the counts of `other` into `self`.
    ///
    /// Used to combine per-reference batches into one run summary.
    pub fn merge(&mut self, other: &RealignmentMetrics) {
        self.total_reads += other.total_reads;
        self.unmapped_reads += other.unmapped_reads;
        self.reads_malformed += other.reads_malformed;
        self.reads_skipped_target_capacity += other.reads_skipped_target_capacity;
        self.regions_processed += other.regions_processed;
        self.regions_without_candidates += other.regions_without_candidates;
        self.regions_without_reference += other.regions_without_reference;
        self.reads_in_regions += other.reads_in_regions;
        self.reads_realigned += other.reads_realigned;
        self.candidates_considered += other.candidates_considered;
    }
}

impl Metric for RealignmentMetrics {
    fn metric_name() -> &'static str {
        "realignment"
    }
}

impl ProcessingMetrics for RealignmentMetrics {
    fn total_input(&self) -> u64 {
        self.total_reads
    }

    fn total_output(&self) -> u64 {
        self.reads_realigned
    }

    fn total_filtered(&self) -> u64 {
        self.reads_malformed + self.reads_skipped_target_capacity
    }
}

/// One row per target region.
///
/// Coordinates are 0-based, half-open (BED-like).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRegionMetric {
    /// Reference sequence name
    pub contig: String,
    /// 0-based start of the region
    pub start: usize,
    /// 0-based exclusive end of the region
    pub end: usize,
    /// Number of member reads
    pub reads: usize,
    /// Number of member reads carrying an indel
    pub indel_reads: usize,
    /// Number of candidate consensuses generated
    pub candidates: usize,
    /// Number of member reads realigned
    pub reads_realigned: usize,
    /// Highest log-odds improvement among realigned reads (0 when none)
    pub max_log_odds: f64,
}

impl Metric for TargetRegionMetric {
    fn metric_name() -> &'static str {
        "target region"
    }
}
