//! The aligned read value the realignment engine operates on.
//!
//! [`AlignedRead`] is immutable once built: fields are private and realignment produces a new
//! value through [`AlignedRead::realigned`] rather than mutating in place.

use bstr::{BStr, BString, ByteSlice};
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use thiserror::Error;

use super::cigar::{read_length, reference_length, soft_clips};
use super::region::ReferenceRegion;

/// Reasons a mapped read's alignment cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedAlignment {
    /// Mapped but carries no reference sequence name
    #[error("mapped read has no reference sequence")]
    MissingReference,

    /// Mapped but carries no alignment start
    #[error("mapped read has no alignment start")]
    MissingStart,

    /// A CIGAR operation has length zero
    #[error("CIGAR contains a zero-length operation")]
    ZeroLengthOperation,

    /// No operation consumes the reference
    #[error("CIGAR has no reference-consuming operation")]
    NoReferenceConsumingOperation,

    /// Read-consuming operations disagree with the sequence length
    #[error("CIGAR consumes {cigar} read bases but the sequence has {sequence}")]
    LengthMismatch {
        /// Read bases consumed by the CIGAR
        cigar: usize,
        /// Length of the stored sequence
        sequence: usize,
    },
}

/// A single insertion or deletion as it appears on the reference.
///
/// The event replaces reference bases `[start, end)` with `inserted`. Deletions have an empty
/// `inserted`; insertions have `start == end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndelEvent {
    /// 0-based first reference position affected
    pub start: usize,
    /// 0-based exclusive end of the replaced reference span
    pub end: usize,
    /// Inserted bases (empty for deletions)
    pub inserted: Vec<u8>,
}

impl IndelEvent {
    /// Number of bases inserted or deleted.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.end - self.start) + self.inserted.len()
    }

    /// True for an event that changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the event is a deletion.
    #[must_use]
    pub fn is_deletion(&self) -> bool {
        self.end > self.start
    }
}

/// An aligned sequencing read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRead {
    name: BString,
    reference_name: Option<String>,
    start: Option<usize>,
    cigar: Vec<Op>,
    sequence: Vec<u8>,
    qualities: Vec<u8>,
    flags: Flags,
    mapping_quality: Option<u8>,
    md: Option<String>,
    edit_distance: Option<u32>,
    original_alignment: Option<(usize, Vec<Op>)>,
}

impl AlignedRead {
    /// Creates a mapped read at the 0-based `start` on `reference_name`.
    #[must_use]
    pub fn mapped(
        name: impl Into<BString>,
        reference_name: impl Into<String>,
        start: usize,
        cigar: Vec<Op>,
        sequence: impl Into<Vec<u8>>,
        qualities: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            reference_name: Some(reference_name.into()),
            start: Some(start),
            cigar,
            sequence: sequence.into(),
            qualities,
            flags: Flags::empty(),
            mapping_quality: None,
            md: None,
            edit_distance: None,
            original_alignment: None,
        }
    }

    /// Creates an unmapped read with no placement.
    #[must_use]
    pub fn unmapped(
        name: impl Into<BString>,
        sequence: impl Into<Vec<u8>>,
        qualities: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            reference_name: None,
            start: None,
            cigar: Vec::new(),
            sequence: sequence.into(),
            qualities,
            flags: Flags::UNMAPPED,
            mapping_quality: None,
            md: None,
            edit_distance: None,
            original_alignment: None,
        }
    }

    /// Sets the SAM flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets (or clears) the placement, keeping everything else.
    #[must_use]
    pub fn with_placement(mut self, reference_name: Option<String>, start: Option<usize>) -> Self {
        self.reference_name = reference_name;
        self.start = start;
        self
    }

    /// Sets the mapping quality.
    #[must_use]
    pub fn with_mapping_quality(mut self, mapping_quality: Option<u8>) -> Self {
        self.mapping_quality = mapping_quality;
        self
    }

    /// Sets the MD string.
    #[must_use]
    pub fn with_md(mut self, md: Option<String>) -> Self {
        self.md = md;
        self
    }

    /// Sets the edit distance (NM).
    #[must_use]
    pub fn with_edit_distance(mut self, edit_distance: Option<u32>) -> Self {
        self.edit_distance = edit_distance;
        self
    }

    /// Sets the pre-realignment start and CIGAR.
    #[must_use]
    pub fn with_original_alignment(mut self, original: Option<(usize, Vec<Op>)>) -> Self {
        self.original_alignment = original;
        self
    }

    /// Returns a copy of this read moved to a new alignment.
    ///
    /// The previous start and CIGAR are kept as the original alignment unless one was already
    /// recorded. Name, bases, qualities, flags and mapping quality carry over unchanged.
    #[must_use]
    pub fn realigned(
        &self,
        start: usize,
        cigar: Vec<Op>,
        md: String,
        edit_distance: u32,
    ) -> AlignedRead {
        let original = self.original_alignment.clone().or_else(|| {
            self.start.map(|old_start| (old_start, self.cigar.clone()))
        });
        AlignedRead {
            name: self.name.clone(),
            reference_name: self.reference_name.clone(),
            start: Some(start),
            cigar,
            sequence: self.sequence.clone(),
            qualities: self.qualities.clone(),
            flags: self.flags,
            mapping_quality: self.mapping_quality,
            md: Some(md),
            edit_distance: Some(edit_distance),
            original_alignment: original,
        }
    }

    /// Read name.
    #[must_use]
    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    /// Reference sequence name, if placed.
    #[must_use]
    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    /// 0-based alignment start, if placed.
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// 0-based exclusive alignment end derived from the CIGAR.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.start.map(|start| start + reference_length(&self.cigar))
    }

    /// CIGAR operations.
    #[must_use]
    pub fn cigar(&self) -> &[Op] {
        &self.cigar
    }

    /// Read bases.
    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Per-base Phred qualities (may be empty).
    #[must_use]
    pub fn qualities(&self) -> &[u8] {
        &self.qualities
    }

    /// SAM flags.
    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// True unless the unmapped flag is set.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped()
    }

    /// Mapping quality.
    #[must_use]
    pub fn mapping_quality(&self) -> Option<u8> {
        self.mapping_quality
    }

    /// MD string.
    #[must_use]
    pub fn md(&self) -> Option<&str> {
        self.md.as_deref()
    }

    /// Edit distance (NM).
    #[must_use]
    pub fn edit_distance(&self) -> Option<u32> {
        self.edit_distance
    }

    /// Start and CIGAR before realignment, when the read has been moved.
    #[must_use]
    pub fn original_alignment(&self) -> Option<(usize, &[Op])> {
        self.original_alignment.as_ref().map(|(start, cigar)| (*start, cigar.as_slice()))
    }

    /// The reference interval covered by the alignment.
    #[must_use]
    pub fn span(&self) -> Option<ReferenceRegion> {
        let name = self.reference_name.as_ref()?;
        let start = self.start?;
        Some(ReferenceRegion::new(name.clone(), start, start + reference_length(&self.cigar)))
    }

    /// Bases between the leading and trailing soft clips.
    #[must_use]
    pub fn aligned_bases(&self) -> &[u8] {
        let (leading, trailing) = soft_clips(&self.cigar);
        let end = self.sequence.len().saturating_sub(trailing);
        self.sequence.get(leading..end).unwrap_or_default()
    }

    /// Checks that a mapped read carries a usable alignment.
    ///
    /// # Errors
    /// Returns the first [`MalformedAlignment`] found.
    pub fn check_alignment(&self) -> Result<(), MalformedAlignment> {
        if self.reference_name.is_none() {
            return Err(MalformedAlignment::MissingReference);
        }
        if self.start.is_none() {
            return Err(MalformedAlignment::MissingStart);
        }
        if self.cigar.iter().any(|op| op.len() == 0) {
            return Err(MalformedAlignment::ZeroLengthOperation);
        }
        if !self.cigar.iter().any(|op| op.kind().consumes_reference()) {
            return Err(MalformedAlignment::NoReferenceConsumingOperation);
        }
        let consumed = read_length(&self.cigar);
        if !self.sequence.is_empty() && consumed != self.sequence.len() {
            return Err(MalformedAlignment::LengthMismatch {
                cigar: consumed,
                sequence: self.sequence.len(),
            });
        }
        Ok(())
    }

    /// True if the CIGAR holds an insertion or deletion no longer than `max_indel_size`.
    #[must_use]
    pub fn has_indel(&self, max_indel_size: usize) -> bool {
        self.cigar.iter().any(|op| {
            matches!(op.kind(), Kind::Insertion | Kind::Deletion) && op.len() <= max_indel_size
        })
    }

    /// Insertions and deletions of this alignment, in reference coordinates.
    ///
    /// Events longer than `max_indel_size` are skipped. Insertions without stored bases (no
    /// sequence) are skipped too since they cannot be replayed.
    #[must_use]
    pub fn indel_events(&self, max_indel_size: usize) -> Vec<IndelEvent> {
        let Some(mut ref_pos) = self.start else {
            return Vec::new();
        };
        let mut read_pos = 0;
        let mut events = Vec::new();

        for op in &self.cigar {
            let len = op.len();
            match op.kind() {
                Kind::Insertion => {
                    if len <= max_indel_size {
                        if let Some(bases) = self.sequence.get(read_pos..read_pos + len) {
                            events.push(IndelEvent {
                                start: ref_pos,
                                end: ref_pos,
                                inserted: bases.to_vec(),
                            });
                        }
                    }
                    read_pos += len;
                }
                Kind::Deletion => {
                    if len <= max_indel_size {
                        events.push(IndelEvent {
                            start: ref_pos,
                            end: ref_pos + len,
                            inserted: Vec::new(),
                        });
                    }
                    ref_pos += len;
                }
                kind => {
                    if kind.consumes_read() {
                        read_pos += len;
                    }
                    if kind.consumes_reference() {
                        ref_pos += len;
                    }
                }
            }
        }

        events
    }
}

/// A read tagged with its position in the engine's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRead {
    /// Stable input index
    pub index: usize,
    /// The read itself
    pub read: AlignedRead,
}

impl IndexedRead {
    /// Pairs a read with its input index.
    #[must_use]
    pub fn new(index: usize, read: AlignedRead) -> Self {
        Self { index, read }
    }
}
