//! Phred-scaled mismatch penalties used to score alignments.
//!
//! Alignment costs are expressed in log10 units: a mismatch at a base with Phred quality `Q`
//! costs `Q / 10`, i.e. `-log10` of the probability that the base call was an error. Summing
//! these gives a log-likelihood-style cost whose difference between two alignments is the
//! log-odds that one placement is better than the other.

/// Maximum Phred score we handle (Q93, matching `SAMUtils.MAX_PHRED_SCORE`)
pub const MAX_PHRED: u8 = 93;

/// Quality assumed for every base of a read that carries no quality scores.
pub const DEFAULT_MISMATCH_QUALITY: u8 = 20;

/// No-call base character
pub const NO_CALL_BASE: u8 = b'N';

/// Phred score type
pub type PhredScore = u8;

/// Returns the cost, in log10 units, of a mismatch at a base of quality `phred`.
///
/// # Examples
/// ```
/// use fgrealign_lib::phred::mismatch_penalty;
///
/// assert!((mismatch_penalty(30) - 3.0).abs() < 1e-12);
/// assert!((mismatch_penalty(0)).abs() < 1e-12);
/// ```
#[inline]
#[must_use]
pub fn mismatch_penalty(phred: PhredScore) -> f64 {
    f64::from(phred.min(MAX_PHRED)) / 10.0
}

/// Returns the quality of the base at `offset`, falling back to
/// [`DEFAULT_MISMATCH_QUALITY`] when the read has no qualities.
#[inline]
#[must_use]
pub fn quality_at(qualities: &[u8], offset: usize) -> PhredScore {
    if qualities.is_empty() {
        DEFAULT_MISMATCH_QUALITY
    } else {
        qualities.get(offset).copied().unwrap_or(DEFAULT_MISMATCH_QUALITY)
    }
}

/// Returns true if two bases disagree.
///
/// Comparison is case-insensitive and a no-call on either side never counts as a mismatch.
///
/// # Examples
/// ```
/// use fgrealign_lib::phred::is_mismatch;
///
/// assert!(is_mismatch(b'A', b'C'));
/// assert!(!is_mismatch(b'a', b'A'));
/// assert!(!is_mismatch(b'N', b'C'));
/// ```
#[inline]
#[must_use]
pub fn is_mismatch(read_base: u8, ref_base: u8) -> bool {
    let read_base = read_base.to_ascii_uppercase();
    let ref_base = ref_base.to_ascii_uppercase();
    read_base != NO_CALL_BASE && ref_base != NO_CALL_BASE && read_base != ref_base
}

/// Sums the mismatch cost of `read` placed against `reference`, base for base.
///
/// `qualities` is indexed by `quality_offset + i` for the i-th base of `read`. The shorter of the
/// two slices bounds the comparison.
#[must_use]
pub fn mismatch_cost(read: &[u8], reference: &[u8], qualities: &[u8], quality_offset: usize) -> f64 {
    read.iter()
        .zip(reference)
        .enumerate()
        .filter(|(_, (r, f))| is_mismatch(**r, **f))
        .map(|(i, _)| mismatch_penalty(quality_at(qualities, quality_offset + i)))
        .sum()
}
