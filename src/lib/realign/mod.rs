//! Local realignment of reads around insertions and deletions.
//!
//! [`IndelRealigner`] wires the stages together:
//!
//! 1. order the reads by reference and start (or verify the declared order)
//! 2. scan them into disjoint [`TargetRegion`]s with [`RegionScanner`]
//! 3. for each region, in parallel: fetch the reference window, propose candidates with the
//!    [`ConsensusGenerator`], score every member with a [`RegionScorer`], and [`rewrite`] the
//!    reads that clear the log-odds threshold
//! 4. [`merge`] everything back into input order
//!
//! The engine never fails on bad reads or empty regions; those are counted in
//! [`RealignmentMetrics`]. It fails only on invalid configuration, undeclared disorder in input
//! declared sorted, or an internal loss of reads.
//!
//! # Example
//!
//! ```
//! use fgrealign_lib::model::AlignedRead;
//! use fgrealign_lib::model::cigar::parse_cigar;
//! use fgrealign_lib::realign::{ConsensusGenerator, IndelRealigner, RealignmentConfig};
//!
//! let config = RealignmentConfig::default();
//! let realigner = IndelRealigner::new(config, ConsensusGenerator::FromReads)?;
//! let cigar = parse_cigar("10M")?;
//! let reads = vec![AlignedRead::mapped("q1", "chr1", 100, cigar, "ACGTACGTAC", vec![])];
//! let output = realigner.realign(reads, None)?;
//! assert_eq!(output.reads.len(), 1);
//! assert_eq!(output.metrics.reads_realigned, 0);
//! # Ok::<(), fgrealign_lib::errors::RealignError>(())
//! ```

pub mod config;
pub mod consensus;
pub mod known_sites;
pub mod md;
pub mod merge;
pub mod reference;
pub mod rewrite;
pub mod scorer;
pub mod targets;

use log::debug;
use rayon::prelude::*;

use crate::errors::Result;
use crate::metrics::{RealignmentMetrics, TargetRegionMetric};
use crate::model::{AlignedRead, IndexedRead, ReferenceRegion};

pub use config::RealignmentConfig;
pub use consensus::{Consensus, ConsensusGenerator, ConsensusSource};
pub use known_sites::{KnownSiteRecord, KnownSites};
pub use merge::merge;
pub use reference::{MdReference, ReferenceSource};
pub use rewrite::rewrite;
pub use scorer::{RealignmentDecision, RegionScorer};
pub use targets::{RegionScan, RegionScanner, ScanCounters, ScanItem, TargetRegion};

/// Result of a realignment run.
#[derive(Debug, Clone)]
pub struct RealignmentOutput {
    /// Every input read, in input order
    pub reads: Vec<AlignedRead>,
    /// Run summary
    pub metrics: RealignmentMetrics,
    /// One row per target region, in scan order
    pub regions: Vec<TargetRegionMetric>,
}

/// How a region ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionStatus {
    Scored,
    NoCandidates,
    NoReference,
}

struct RegionOutcome {
    reads: Vec<IndexedRead>,
    metric: TargetRegionMetric,
    status: RegionStatus,
}

/// Reads scanned into target regions plus everything left over.
struct Scanned {
    targets: Vec<TargetRegion>,
    unaffected: Vec<IndexedRead>,
    counters: ScanCounters,
}

/// The indel realignment engine.
#[derive(Debug, Clone)]
pub struct IndelRealigner {
    config: RealignmentConfig,
    generator: ConsensusGenerator,
}

impl IndelRealigner {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    /// Returns [`crate::errors::RealignError::InvalidParameter`] for invalid configuration.
    pub fn new(config: RealignmentConfig, generator: ConsensusGenerator) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, generator })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &RealignmentConfig {
        &self.config
    }

    /// The candidate strategy.
    #[must_use]
    pub fn generator(&self) -> &ConsensusGenerator {
        &self.generator
    }

    /// Realigns `reads`, returning every read in input order.
    ///
    /// Region reference windows come from `reference` when given, otherwise they are rebuilt
    /// from the member reads' MD tags.
    ///
    /// # Errors
    /// Returns [`crate::errors::RealignError::InputNotSorted`] when the configuration declares
    /// sorted input that is not, or [`crate::errors::RealignError::CardinalityMismatch`] if
    /// reads are lost or duplicated.
    pub fn realign(
        &self,
        reads: Vec<AlignedRead>,
        reference: Option<&dyn ReferenceSource>,
    ) -> Result<RealignmentOutput> {
        let total = reads.len();
        let Scanned { targets, unaffected, counters } = self.scan(reads)?;
        debug!("Found {} target regions among {} reads", targets.len(), total);

        let outcomes: Vec<RegionOutcome> = targets
            .into_par_iter()
            .map(|target| self.process_region(target, reference, true))
            .collect();

        let mut metrics = metrics_from_counters(&counters);
        let mut regions = Vec::with_capacity(outcomes.len());
        let mut region_reads = Vec::new();
        for outcome in outcomes {
            record_outcome(&mut metrics, &outcome);
            regions.push(outcome.metric);
            region_reads.extend(outcome.reads);
        }

        let reads = merge(total, unaffected.into_iter().chain(region_reads))?;
        Ok(RealignmentOutput { reads, metrics, regions })
    }

    /// Describes the target regions of `reads` without realigning anything.
    ///
    /// # Errors
    /// Returns [`crate::errors::RealignError::InputNotSorted`] when the configuration declares
    /// sorted input that is not.
    pub fn describe_targets(
        &self,
        reads: Vec<AlignedRead>,
        reference: Option<&dyn ReferenceSource>,
    ) -> Result<(Vec<TargetRegionMetric>, RealignmentMetrics)> {
        let Scanned { targets, counters, .. } = self.scan(reads)?;
        let outcomes: Vec<RegionOutcome> = targets
            .into_par_iter()
            .map(|target| self.process_region(target, reference, false))
            .collect();

        let mut metrics = metrics_from_counters(&counters);
        let mut regions = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            record_outcome(&mut metrics, &outcome);
            regions.push(outcome.metric);
        }
        Ok((regions, metrics))
    }

    fn scan(&self, reads: Vec<AlignedRead>) -> Result<Scanned> {
        let mut indexed: Vec<IndexedRead> =
            reads.into_iter().enumerate().map(|(i, r)| IndexedRead::new(i, r)).collect();
        if !self.config.is_sorted {
            targets::sort_for_scan(&mut indexed);
        }

        let mut scan = RegionScan::new(indexed.into_iter(), &self.config);
        let mut targets = Vec::new();
        let mut unaffected = Vec::new();
        for item in scan.by_ref() {
            match item? {
                ScanItem::Target(target) => targets.push(target),
                ScanItem::Unaffected(read) => unaffected.push(read),
            }
        }
        Ok(Scanned { targets, unaffected, counters: scan.counters() })
    }

    fn process_region(
        &self,
        target: TargetRegion,
        reference: Option<&dyn ReferenceSource>,
        score: bool,
    ) -> RegionOutcome {
        let (region, members) = target.into_parts();
        let window = fetch_window(&region, &members, reference);
        let candidates =
            self.generator.generate(&region, &members, window.as_deref(), &self.config);

        let mut metric = TargetRegionMetric {
            contig: region.reference_name().to_string(),
            start: region.start(),
            end: region.end(),
            reads: members.len(),
            indel_reads: members
                .iter()
                .filter(|m| m.read.has_indel(self.config.max_indel_size))
                .count(),
            candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            debug!("No candidate consensus for region {region}");
            return RegionOutcome { reads: members, metric, status: RegionStatus::NoCandidates };
        }
        let Some(window) = window else {
            debug!("No reference available for region {region}");
            return RegionOutcome { reads: members, metric, status: RegionStatus::NoReference };
        };
        if !score {
            return RegionOutcome { reads: members, metric, status: RegionStatus::Scored };
        }

        let scorer =
            RegionScorer::new(window, region.start(), &candidates, self.config.lod_threshold);
        let reads = members
            .into_iter()
            .map(|IndexedRead { index, read }| {
                let decision = scorer.decide(&read);
                if decision.is_realign() {
                    metric.reads_realigned += 1;
                    metric.max_log_odds = metric.max_log_odds.max(decision.log_odds());
                }
                IndexedRead::new(index, rewrite(read, &decision, scorer.window(), region.start()))
            })
            .collect();

        debug!(
            "Region {}: {} reads, {} candidates, {} realigned",
            region, metric.reads, metric.candidates, metric.reads_realigned
        );
        RegionOutcome { reads, metric, status: RegionStatus::Scored }
    }
}

/// Fetches the reference bases of `region` from `reference`, or from the members' MD tags.
fn fetch_window(
    region: &ReferenceRegion,
    members: &[IndexedRead],
    reference: Option<&dyn ReferenceSource>,
) -> Option<Vec<u8>> {
    let (name, start, end) = (region.reference_name(), region.start(), region.end());
    let window = match reference {
        Some(source) => source.fetch(name, start, end),
        None => {
            let rebuilt = MdReference::from_reads(name, members.iter().map(|m| &m.read));
            rebuilt.fetch(name, start, end)
        }
    };
    window.filter(|bases| bases.len() == region.width())
}

fn metrics_from_counters(counters: &ScanCounters) -> RealignmentMetrics {
    RealignmentMetrics {
        total_reads: counters.reads,
        unmapped_reads: counters.unmapped,
        reads_malformed: counters.malformed,
        reads_skipped_target_capacity: counters.skipped_target_capacity,
        ..Default::default()
    }
}

fn record_outcome(metrics: &mut RealignmentMetrics, outcome: &RegionOutcome) {
    metrics.regions_processed += 1;
    metrics.reads_in_regions += outcome.metric.reads as u64;
    metrics.candidates_considered += outcome.metric.candidates as u64;
    metrics.reads_realigned += outcome.metric.reads_realigned as u64;
    match outcome.status {
        RegionStatus::NoCandidates => metrics.regions_without_candidates += 1,
        RegionStatus::NoReference => metrics.regions_without_reference += 1,
        RegionStatus::Scored => {}
    }
}
