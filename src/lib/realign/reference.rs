//! Sources of reference bases for target region windows.

use log::debug;

use crate::model::AlignedRead;

use super::md::reconstruct_reference;

/// Provides reference bases for a half-open, 0-based interval.
///
/// Implementations must be shareable across the worker threads that process regions.
pub trait ReferenceSource: Send + Sync {
    /// Returns the bases of `[start, end)` on `reference_name`, or `None` if unavailable.
    fn fetch(&self, reference_name: &str, start: usize, end: usize) -> Option<Vec<u8>>;
}

/// Reference bases reconstructed from the MD tags of a set of reads on one reference.
///
/// Positions not covered by any read with a usable MD tag stay unknown, and any fetch touching
/// an unknown position returns `None`.
#[derive(Debug, Clone, Default)]
pub struct MdReference {
    reference_name: String,
    offset: usize,
    bases: Vec<Option<u8>>,
}

impl MdReference {
    /// Builds the reference from every read on `reference_name` that carries an MD tag.
    pub fn from_reads<'a>(
        reference_name: &str,
        reads: impl IntoIterator<Item = &'a AlignedRead>,
    ) -> Self {
        let mut pieces = Vec::new();
        for read in reads {
            if read.reference_name() != Some(reference_name) {
                continue;
            }
            let (Some(start), Some(md)) = (read.start(), read.md()) else {
                continue;
            };
            match reconstruct_reference(read.sequence(), read.cigar(), md) {
                Ok(Some(bases)) => pieces.push((start, bases)),
                Ok(None) => {}
                Err(e) => debug!("Ignoring MD tag of read '{}': {}", read.name(), e),
            }
        }

        let offset = pieces.iter().map(|(start, _)| *start).min().unwrap_or(0);
        let end = pieces.iter().map(|(start, bases)| start + bases.len()).max().unwrap_or(0);
        let mut known = vec![None; end.saturating_sub(offset)];
        for (start, bases) in pieces {
            for (i, base) in bases.into_iter().enumerate() {
                let slot = &mut known[start - offset + i];
                if slot.is_none() {
                    *slot = Some(base.to_ascii_uppercase());
                }
            }
        }

        Self { reference_name: reference_name.to_string(), offset, bases: known }
    }

    /// Number of positions with a known base.
    #[must_use]
    pub fn known_positions(&self) -> usize {
        self.bases.iter().filter(|b| b.is_some()).count()
    }
}

impl ReferenceSource for MdReference {
    fn fetch(&self, reference_name: &str, start: usize, end: usize) -> Option<Vec<u8>> {
        if reference_name != self.reference_name || start < self.offset || end < start {
            return None;
        }
        self.bases.get(start - self.offset..end - self.offset)?.iter().copied().collect()
    }
}
