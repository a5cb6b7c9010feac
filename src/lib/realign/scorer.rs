//! Realignment scoring.
//!
//! Costs are quality-scaled mismatch sums in log10 units (see [`crate::phred`]). For each member
//! read, the cost of its current alignment against the region reference is compared with the
//! cheapest placement of the read on every candidate consensus; the difference is the log-odds
//! in favour of moving the read.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::model::AlignedRead;
use crate::model::cigar::{is_aligned_kind, push_op, soft_clips};
use crate::phred::{is_mismatch, mismatch_cost, mismatch_penalty, quality_at};

use super::consensus::Consensus;

/// Costs closer than this are treated as equal.
pub const COST_TOLERANCE: f64 = 1e-9;

/// Outcome of scoring one read against a region's candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum RealignmentDecision {
    /// Keep the current alignment
    NoChange {
        /// Improvement of the best placement over the current alignment (0 when unplaceable)
        log_odds: f64,
    },
    /// Move the read onto a consensus
    Realign {
        /// Index of the chosen candidate
        consensus: usize,
        /// Improvement over the current alignment
        log_odds: f64,
        /// Cost of the new placement
        cost: f64,
        /// New 0-based alignment start
        start: usize,
        /// New CIGAR
        cigar: Vec<Op>,
    },
}

impl RealignmentDecision {
    /// The log-odds carried by either variant.
    #[must_use]
    pub fn log_odds(&self) -> f64 {
        match self {
            RealignmentDecision::NoChange { log_odds }
            | RealignmentDecision::Realign { log_odds, .. } => *log_odds,
        }
    }

    /// True if the read should be moved.
    #[must_use]
    pub fn is_realign(&self) -> bool {
        matches!(self, RealignmentDecision::Realign { .. })
    }
}

/// Cost of the read's current alignment against `window`, which starts at `window_start`.
///
/// Aligned bases outside the window are not scored.
#[must_use]
pub fn original_cost(read: &AlignedRead, window: &[u8], window_start: usize) -> f64 {
    let Some(mut ref_pos) = read.start() else {
        return 0.0;
    };
    let sequence = read.sequence();
    let qualities = read.qualities();
    let mut read_pos = 0;
    let mut cost = 0.0;

    for op in read.cigar() {
        let len = op.len();
        let kind = op.kind();
        if is_aligned_kind(kind) {
            for i in 0..len {
                let ref_base = (ref_pos + i)
                    .checked_sub(window_start)
                    .and_then(|offset| window.get(offset).copied());
                if let (Some(read_base), Some(ref_base)) = (sequence.get(read_pos + i), ref_base) {
                    if is_mismatch(*read_base, ref_base) {
                        cost += mismatch_penalty(quality_at(qualities, read_pos + i));
                    }
                }
            }
        }
        if kind.consumes_read() {
            read_pos += len;
        }
        if kind.consumes_reference() {
            ref_pos += len;
        }
    }
    cost
}

/// A candidate prepared for scoring: its consensus sequence and the event's window offsets.
#[derive(Debug, Clone)]
struct PreparedConsensus {
    sequence: Vec<u8>,
    event_offset: usize,
    inserted: usize,
    deleted: usize,
}

/// Best placement found for a read on one consensus.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    offset: usize,
    cost: f64,
}

/// Scores reads of one target region against its candidate consensuses.
#[derive(Debug, Clone)]
pub struct RegionScorer {
    window_start: usize,
    window: Vec<u8>,
    candidates: Vec<Option<PreparedConsensus>>,
    lod_threshold: f64,
}

impl RegionScorer {
    /// Prepares scoring for a region whose reference `window` starts at `window_start`.
    ///
    /// Candidates whose event lies outside the window stay in place (so indices line up) but
    /// never win.
    #[must_use]
    pub fn new(
        window: Vec<u8>,
        window_start: usize,
        candidates: &[Consensus],
        lod_threshold: f64,
    ) -> Self {
        let candidates = candidates
            .iter()
            .map(|c| {
                c.apply(&window, window_start).map(|sequence| PreparedConsensus {
                    sequence,
                    event_offset: c.ref_start() - window_start,
                    inserted: c.inserted().len(),
                    deleted: c.ref_end() - c.ref_start(),
                })
            })
            .collect();
        Self { window_start, window, candidates, lod_threshold }
    }

    /// The region reference bases.
    #[must_use]
    pub fn window(&self) -> &[u8] {
        &self.window
    }

    /// 0-based reference position of the first window base.
    #[must_use]
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// Decides whether `read` should move onto one of the candidates.
    #[must_use]
    pub fn decide(&self, read: &AlignedRead) -> RealignmentDecision {
        let original = original_cost(read, &self.window, self.window_start);
        let (leading, _) = soft_clips(read.cigar());
        let core = read.aligned_bases();

        let mut best: Option<(usize, Placement)> = None;
        for (index, candidate) in self.candidates.iter().enumerate() {
            let Some(candidate) = candidate else { continue };
            let Some(placement) = best_placement(core, read.qualities(), leading, candidate) else {
                continue;
            };
            if best.is_none_or(|(_, b)| placement.cost < b.cost - COST_TOLERANCE) {
                best = Some((index, placement));
            }
        }

        let Some((index, placement)) = best else {
            return RealignmentDecision::NoChange { log_odds: 0.0 };
        };

        let log_odds = original - placement.cost;
        if log_odds > self.lod_threshold && placement.cost < original {
            let candidate = self.candidates[index].as_ref();
            let cigar = candidate.map_or_else(Vec::new, |c| {
                build_cigar(read.cigar(), core.len(), placement.offset, c)
            });
            RealignmentDecision::Realign {
                consensus: index,
                log_odds,
                cost: placement.cost,
                start: self.window_start + placement.offset,
                cigar,
            }
        } else {
            RealignmentDecision::NoChange { log_odds }
        }
    }
}

/// Lowest-cost anchored placement of `core` on the consensus; ties go to the lowest offset.
///
/// A placement at offset `o` is anchored when the read starts before the event and ends after
/// it, so at least one aligned base lies on each side.
fn best_placement(
    core: &[u8],
    qualities: &[u8],
    quality_offset: usize,
    candidate: &PreparedConsensus,
) -> Option<Placement> {
    let len = core.len();
    let a = candidate.event_offset;
    if len == 0 || len > candidate.sequence.len() || a == 0 {
        return None;
    }
    let last_offset = candidate.sequence.len() - len;
    let first_offset = (a + candidate.inserted + 1).saturating_sub(len);

    let mut best: Option<Placement> = None;
    for offset in first_offset..a.min(last_offset + 1) {
        let window = &candidate.sequence[offset..offset + len];
        let cost = mismatch_cost(core, window, qualities, quality_offset);
        if best.is_none_or(|b| cost < b.cost - COST_TOLERANCE) {
            best = Some(Placement { offset, cost });
        }
    }
    best
}

/// CIGAR of a read placed at `offset` on a consensus, keeping the read's clips.
fn build_cigar(
    original: &[Op],
    core_len: usize,
    offset: usize,
    candidate: &PreparedConsensus,
) -> Vec<Op> {
    let leading_hard =
        original.first().filter(|op| op.kind() == Kind::HardClip).map_or(0, |op| op.len());
    let trailing_hard = if original.len() > 1 {
        original.last().filter(|op| op.kind() == Kind::HardClip).map_or(0, |op| op.len())
    } else {
        0
    };
    let (leading_soft, trailing_soft) = soft_clips(original);

    let before = candidate.event_offset - offset;
    let after = core_len - before - candidate.inserted;

    let mut cigar = Vec::with_capacity(7);
    push_op(&mut cigar, Kind::HardClip, leading_hard);
    push_op(&mut cigar, Kind::SoftClip, leading_soft);
    push_op(&mut cigar, Kind::Match, before);
    push_op(&mut cigar, Kind::Insertion, candidate.inserted);
    push_op(&mut cigar, Kind::Deletion, candidate.deleted);
    push_op(&mut cigar, Kind::Match, after);
    push_op(&mut cigar, Kind::SoftClip, trailing_soft);
    push_op(&mut cigar, Kind::HardClip, trailing_hard);
    cigar
}
