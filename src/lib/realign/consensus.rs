//! Candidate consensus generation.
//!
//! A [`Consensus`] is an alternate reference for a target region: the region's reference window
//! with one insertion or deletion applied. Candidates come either from the indels observed in
//! the region's reads or from a table of known sites, selected by [`ConsensusGenerator`].

use std::cmp::Reverse;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::model::{IndelEvent, IndexedRead, ReferenceRegion};

use super::config::RealignmentConfig;
use super::known_sites::KnownSites;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsensusSource {
    /// Observed in member reads
    Reads,
    /// Taken from the known-sites table
    KnownSite,
}

/// One candidate alternate reference for a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consensus {
    event: IndelEvent,
    source: ConsensusSource,
    support: usize,
}

impl Consensus {
    /// Creates a candidate.
    #[must_use]
    pub fn new(event: IndelEvent, source: ConsensusSource, support: usize) -> Self {
        Self { event, source, support }
    }

    /// The insertion or deletion this candidate applies.
    #[must_use]
    pub fn event(&self) -> &IndelEvent {
        &self.event
    }

    /// 0-based first replaced reference position.
    #[must_use]
    pub fn ref_start(&self) -> usize {
        self.event.start
    }

    /// 0-based exclusive end of the replaced reference span.
    #[must_use]
    pub fn ref_end(&self) -> usize {
        self.event.end
    }

    /// Inserted bases (empty for a deletion).
    #[must_use]
    pub fn inserted(&self) -> &[u8] {
        &self.event.inserted
    }

    /// Origin of the candidate.
    #[must_use]
    pub fn source(&self) -> ConsensusSource {
        self.source
    }

    /// Number of distinct member reads carrying the event (0 for known sites).
    #[must_use]
    pub fn support(&self) -> usize {
        self.support
    }

    /// Builds the consensus sequence over a reference window starting at `window_start`.
    ///
    /// Returns `None` if the event does not fall inside the window.
    #[must_use]
    pub fn apply(&self, window: &[u8], window_start: usize) -> Option<Vec<u8>> {
        let a = self.event.start.checked_sub(window_start)?;
        let b = self.event.end.checked_sub(window_start)?;
        if b > window.len() {
            return None;
        }
        let mut sequence = Vec::with_capacity(window.len() - (b - a) + self.event.inserted.len());
        sequence.extend_from_slice(&window[..a]);
        sequence.extend_from_slice(&self.event.inserted);
        sequence.extend_from_slice(&window[b..]);
        Some(sequence)
    }
}

/// Shifts an indel to its leftmost equivalent position within `window`.
///
/// A deletion moves left while the base before it equals its last deleted base; an insertion
/// moves left while the base before it equals its last inserted base, rotating the inserted
/// bases. Events outside the window are returned unchanged.
#[must_use]
pub fn left_normalize(event: &IndelEvent, window: &[u8], window_start: usize) -> IndelEvent {
    let mut normalized = event.clone();
    if normalized.is_empty() || normalized.start < window_start {
        return normalized;
    }
    let base = |pos: usize| window.get(pos - window_start).copied();

    if normalized.is_deletion() {
        if normalized.end - window_start > window.len() {
            return normalized;
        }
        while normalized.start > window_start {
            match (base(normalized.start - 1), base(normalized.end - 1)) {
                (Some(before), Some(last)) if before.eq_ignore_ascii_case(&last) => {
                    normalized.start -= 1;
                    normalized.end -= 1;
                }
                _ => break,
            }
        }
    } else {
        while normalized.start > window_start {
            let Some(before) = base(normalized.start - 1) else { break };
            let Some(&last) = normalized.inserted.last() else { break };
            if !before.eq_ignore_ascii_case(&last) {
                break;
            }
            normalized.inserted.rotate_right(1);
            normalized.start -= 1;
            normalized.end -= 1;
        }
    }
    normalized.inserted.make_ascii_uppercase();
    normalized
}

/// Strategy used to propose candidates for each region.
#[derive(Debug, Clone)]
pub enum ConsensusGenerator {
    /// Candidates from indels observed in the region's reads
    FromReads,
    /// Candidates from a shared table of known indels
    FromKnownSites(Arc<KnownSites>),
}

impl ConsensusGenerator {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ConsensusGenerator::FromReads => "reads",
            ConsensusGenerator::FromKnownSites(_) => "known sites",
        }
    }

    /// Proposes at most `config.max_consensus_number` ranked candidates for `region`.
    ///
    /// `window` holds the reference bases of the region when available and is used to
    /// left-normalize observed indels. The result is deterministic for identical input.
    #[must_use]
    pub fn generate(
        &self,
        region: &ReferenceRegion,
        members: &[IndexedRead],
        window: Option<&[u8]>,
        config: &RealignmentConfig,
    ) -> Vec<Consensus> {
        let mut candidates = match self {
            ConsensusGenerator::FromReads => from_reads(region, members, window, config),
            ConsensusGenerator::FromKnownSites(sites) => from_known_sites(region, sites, config),
        };
        candidates.truncate(config.max_consensus_number);
        candidates
    }
}

fn from_reads(
    region: &ReferenceRegion,
    members: &[IndexedRead],
    window: Option<&[u8]>,
    config: &RealignmentConfig,
) -> Vec<Consensus> {
    let mut support: AHashMap<IndelEvent, AHashSet<usize>> = AHashMap::new();
    for member in members {
        for event in member.read.indel_events(config.max_indel_size) {
            let event = match window {
                Some(window) => left_normalize(&event, window, region.start()),
                None => IndelEvent { inserted: event.inserted.to_ascii_uppercase(), ..event },
            };
            support.entry(event).or_default().insert(member.index);
        }
    }

    let mut candidates: Vec<Consensus> = support
        .into_iter()
        .map(|(event, reads)| Consensus::new(event, ConsensusSource::Reads, reads.len()))
        .collect();
    candidates.sort_by(|a, b| {
        let key = |c: &Consensus| (Reverse(c.support), c.event.start, c.event.len());
        key(a).cmp(&key(b)).then_with(|| a.event.inserted.cmp(&b.event.inserted))
    });
    candidates
}

fn from_known_sites(
    region: &ReferenceRegion,
    sites: &KnownSites,
    config: &RealignmentConfig,
) -> Vec<Consensus> {
    let center = region.center();
    let mut candidates: Vec<Consensus> = sites
        .within(region)
        .filter(|event| event.len() <= config.max_indel_size)
        .map(|event| Consensus::new(event.clone(), ConsensusSource::KnownSite, 0))
        .collect();
    candidates.sort_by(|a, b| {
        let key = |c: &Consensus| (c.event.start.abs_diff(center), c.event.start, c.event.len());
        key(a).cmp(&key(b)).then_with(|| a.event.inserted.cmp(&b.event.inserted))
    });
    candidates
}
