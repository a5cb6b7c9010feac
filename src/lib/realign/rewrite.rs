//! Applies accepted realignments to reads.

use crate::model::AlignedRead;

use super::md::compute_md_and_nm;
use super::scorer::RealignmentDecision;

/// Returns the read moved according to `decision`.
///
/// An accepted realignment yields a new read with the new start and CIGAR, MD and NM
/// regenerated against `window` (the reference bases starting at `window_start`), and the old
/// alignment kept as the original alignment. Anything else returns `read` unchanged.
#[must_use]
pub fn rewrite(
    read: AlignedRead,
    decision: &RealignmentDecision,
    window: &[u8],
    window_start: usize,
) -> AlignedRead {
    match decision {
        RealignmentDecision::Realign { start, cigar, .. } => {
            let reference = start
                .checked_sub(window_start)
                .and_then(|offset| window.get(offset..))
                .unwrap_or_default();
            let (md, nm) = compute_md_and_nm(read.sequence(), cigar, reference);
            read.realigned(*start, cigar.clone(), md, nm)
        }
        RealignmentDecision::NoChange { .. } => read,
    }
}
