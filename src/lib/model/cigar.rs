//! Helpers over noodles CIGAR operations.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::errors::{RealignError, Result};

/// Parses a CIGAR string such as `10M2I5M` into noodles operations.
///
/// `*` and the empty string parse to an empty CIGAR.
///
/// # Errors
/// Returns [`RealignError::InvalidParameter`] on an unknown operation, a missing length, or a
/// trailing length without an operation.
pub fn parse_cigar(cigar: &str) -> Result<Vec<Op>> {
    let invalid = |reason: String| RealignError::InvalidParameter {
        parameter: "cigar".to_string(),
        reason: format!("'{cigar}': {reason}"),
    };

    if cigar.is_empty() || cigar == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<usize> = None;
    for ch in cigar.chars() {
        if let Some(digit) = ch.to_digit(10) {
            len = Some(len.unwrap_or(0) * 10 + digit as usize);
            continue;
        }
        let kind = match ch {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            other => return Err(invalid(format!("unknown operation '{other}'"))),
        };
        let n = len.take().ok_or_else(|| invalid(format!("operation '{ch}' has no length")))?;
        ops.push(Op::new(kind, n));
    }

    if len.is_some() {
        return Err(invalid("trailing length without an operation".to_string()));
    }
    Ok(ops)
}

fn kind_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

/// Formats operations as a SAM CIGAR string (`*` when empty).
#[must_use]
pub fn cigar_to_string(ops: &[Op]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    ops.iter().map(|op| format!("{}{}", op.len(), kind_char(op.kind()))).collect()
}

/// True for the aligned-base kinds that are scored against the reference.
#[inline]
#[must_use]
pub fn is_aligned_kind(kind: Kind) -> bool {
    matches!(kind, Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch)
}

/// Number of reference bases spanned by the operations.
#[must_use]
pub fn reference_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| op.kind().consumes_reference()).map(|op| op.len()).sum()
}

/// Number of read bases consumed by the operations.
#[must_use]
pub fn read_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| op.kind().consumes_read()).map(|op| op.len()).sum()
}

/// Lengths of the leading and trailing soft clips, looking through hard clips.
#[must_use]
pub fn soft_clips(ops: &[Op]) -> (usize, usize) {
    let clip = |op: &&Op| op.kind() != Kind::HardClip;
    let leading = ops
        .iter()
        .find(clip)
        .filter(|op| op.kind() == Kind::SoftClip)
        .map_or(0, |op| op.len());
    let trailing = ops
        .iter()
        .rev()
        .find(clip)
        .filter(|op| op.kind() == Kind::SoftClip)
        .map_or(0, |op| op.len());
    (leading, trailing)
}

/// Appends `op` to `ops`, merging with the previous operation of the same kind and dropping
/// zero-length operations.
pub fn push_op(ops: &mut Vec<Op>, kind: Kind, len: usize) {
    if len == 0 {
        return;
    }
    match ops.last_mut() {
        Some(last) if last.kind() == kind => *last = Op::new(kind, last.len() + len),
        _ => ops.push(Op::new(kind, len)),
    }
}
