//! SAM `MD` tag parsing, reference reconstruction, and regeneration.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::errors::{RealignError, Result};
use crate::model::cigar::is_aligned_kind;

/// One element of an MD string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdToken {
    /// A run of matching bases
    Match(usize),
    /// A reference base that differs from the read
    Mismatch(u8),
    /// Reference bases deleted from the read
    Deletion(Vec<u8>),
}

/// Parses an MD string into tokens.
///
/// # Errors
/// Returns [`RealignError::InvalidMdTag`] on characters outside `[0-9A-Za-z^]` or an empty
/// deletion.
pub fn parse_md(md: &str) -> Result<Vec<MdToken>> {
    let invalid = |reason: &str| RealignError::InvalidMdTag {
        md: md.to_string(),
        reason: reason.to_string(),
    };

    let bytes = md.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            let mut n = 0usize;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                n = n * 10 + usize::from(bytes[i] - b'0');
                i += 1;
            }
            if n > 0 {
                tokens.push(MdToken::Match(n));
            }
        } else if b == b'^' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if start == i {
                return Err(invalid("empty deletion"));
            }
            tokens.push(MdToken::Deletion(bytes[start..i].to_vec()));
        } else if b.is_ascii_alphabetic() {
            tokens.push(MdToken::Mismatch(b));
            i += 1;
        } else {
            return Err(invalid("unexpected character"));
        }
    }
    Ok(tokens)
}

/// Rebuilds the reference bases under an alignment from its read bases, CIGAR and MD string.
///
/// The returned vector covers the alignment's reference span: one base per aligned or deleted
/// reference position. Skipped (`N`) positions cannot be recovered and yield `None`.
///
/// # Errors
/// Returns [`RealignError::InvalidMdTag`] if the MD string disagrees with the CIGAR.
pub fn reconstruct_reference(sequence: &[u8], cigar: &[Op], md: &str) -> Result<Option<Vec<u8>>> {
    let invalid = |reason: &str| RealignError::InvalidMdTag {
        md: md.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = parse_md(md)?.into_iter();
    let mut current: Option<MdToken> = tokens.next();
    let mut reference = Vec::new();
    let mut read_pos = 0;

    for op in cigar {
        let len = op.len();
        match op.kind() {
            kind if is_aligned_kind(kind) => {
                let mut remaining = len;
                while remaining > 0 {
                    match current.take() {
                        Some(MdToken::Match(n)) => {
                            let take = n.min(remaining);
                            let bases = sequence
                                .get(read_pos..read_pos + take)
                                .ok_or_else(|| invalid("MD extends past the read"))?;
                            reference.extend_from_slice(bases);
                            read_pos += take;
                            remaining -= take;
                            current =
                                if n > take { Some(MdToken::Match(n - take)) } else { tokens.next() };
                        }
                        Some(MdToken::Mismatch(base)) => {
                            reference.push(base);
                            read_pos += 1;
                            remaining -= 1;
                            current = tokens.next();
                        }
                        Some(MdToken::Deletion(_)) => {
                            return Err(invalid("deletion where the CIGAR has aligned bases"));
                        }
                        None => return Err(invalid("MD shorter than the CIGAR")),
                    }
                }
            }
            Kind::Deletion => match current.take() {
                Some(MdToken::Deletion(bases)) if bases.len() == len => {
                    reference.extend_from_slice(&bases);
                    current = tokens.next();
                }
                _ => return Err(invalid("deletion does not match the CIGAR")),
            },
            Kind::Skip => return Ok(None),
            Kind::Insertion | Kind::SoftClip => read_pos += len,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(invalid("MD longer than the CIGAR"));
    }
    Ok(Some(reference))
}

/// Computes the MD string and edit distance of an alignment against `reference`.
///
/// `reference` must start at the alignment start. Mismatches are case-insensitive; the edit
/// distance counts mismatches plus inserted and deleted bases.
#[must_use]
pub fn compute_md_and_nm(sequence: &[u8], cigar: &[Op], reference: &[u8]) -> (String, u32) {
    let mut md = String::new();
    let mut run = 0usize;
    let mut nm = 0u32;
    let mut read_pos = 0;
    let mut ref_pos = 0;

    for op in cigar {
        let len = op.len();
        match op.kind() {
            kind if is_aligned_kind(kind) => {
                for _ in 0..len {
                    let read_base = sequence.get(read_pos).copied().unwrap_or(b'N');
                    let ref_base = reference.get(ref_pos).copied().unwrap_or(b'N');
                    if read_base.eq_ignore_ascii_case(&ref_base) {
                        run += 1;
                    } else {
                        md.push_str(&run.to_string());
                        md.push(char::from(ref_base.to_ascii_uppercase()));
                        run = 0;
                        nm += 1;
                    }
                    read_pos += 1;
                    ref_pos += 1;
                }
            }
            Kind::Deletion => {
                md.push_str(&run.to_string());
                md.push('^');
                for offset in 0..len {
                    let base = reference.get(ref_pos + offset).copied().unwrap_or(b'N');
                    md.push(char::from(base.to_ascii_uppercase()));
                }
                run = 0;
                ref_pos += len;
                nm += u32::try_from(len).unwrap_or(u32::MAX);
            }
            Kind::Insertion => {
                read_pos += len;
                nm += u32::try_from(len).unwrap_or(u32::MAX);
            }
            Kind::SoftClip => read_pos += len,
            Kind::Skip => ref_pos += len,
            _ => {}
        }
    }
    md.push_str(&run.to_string());
    (md, nm)
}
