//! Builders for test records, headers, BAM files and FASTA files.
//!
//! Used by unit tests, integration tests and benchmarks.
//!
//! ```rust
//! use fgrealign_lib::sam::builder::{RecordBuilder, header_with_references};
//!
//! let header = header_with_references(&[("chr1", 1000)], Some("coordinate"));
//! let record = RecordBuilder::new()
//!     .name("read1")
//!     .sequence("ACGTACGT")
//!     .reference_sequence_id(0)
//!     .alignment_start(100)
//!     .cigar("4M1D4M")
//!     .build();
//! assert_eq!(header.reference_sequences().len(), 1);
//! ```

use anyhow::Result;
use bstr::BString;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value as BufValue;
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::header::record::value::map::{self, ReferenceSequence};
use std::num::NonZeroUsize;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::bam_io::create_bam_writer;
use crate::model::cigar::parse_cigar;

/// Base quality given to every base when a record sets no qualities.
pub const DEFAULT_BASE_QUALITY: u8 = 30;

/// Builder for a single [`RecordBuf`].
///
/// Positions are 1-based, as in SAM. A record with a sequence and no CIGAR gets `{len}M` when it
/// is placed, and qualities default to [`DEFAULT_BASE_QUALITY`].
#[derive(Debug, Default)]
pub struct RecordBuilder {
    name: Option<String>,
    flags: Flags,
    reference_sequence_id: Option<usize>,
    alignment_start: Option<usize>,
    mapping_quality: Option<u8>,
    cigar: Option<String>,
    sequence: Vec<u8>,
    qualities: Vec<u8>,
    tags: Vec<(Tag, BufValue)>,
}

impl RecordBuilder {
    /// Creates a builder with mapping quality 60 and nothing else set.
    #[must_use]
    pub fn new() -> Self {
        Self { mapping_quality: Some(60), ..Self::default() }
    }

    /// Sets the read name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the bases.
    #[must_use]
    pub fn sequence(mut self, bases: &str) -> Self {
        self.sequence = bases.as_bytes().to_vec();
        self
    }

    /// Sets the base qualities.
    #[must_use]
    pub fn qualities(mut self, quals: &[u8]) -> Self {
        self.qualities = quals.to_vec();
        self
    }

    /// Replaces the flags.
    #[must_use]
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets or clears the unmapped flag.
    #[must_use]
    pub fn unmapped(mut self, unmapped: bool) -> Self {
        self.flags.set(Flags::UNMAPPED, unmapped);
        self
    }

    /// Sets the reference sequence ID (0-based).
    #[must_use]
    pub fn reference_sequence_id(mut self, id: usize) -> Self {
        self.reference_sequence_id = Some(id);
        self
    }

    /// Sets the alignment start (1-based).
    #[must_use]
    pub fn alignment_start(mut self, pos: usize) -> Self {
        self.alignment_start = Some(pos);
        self
    }

    /// Sets the mapping quality.
    #[must_use]
    pub fn mapping_quality(mut self, mapq: u8) -> Self {
        self.mapping_quality = Some(mapq);
        self
    }

    /// Sets the CIGAR string.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(cigar.to_string());
        self
    }

    /// Adds a tag; names that are not two characters long are ignored.
    #[must_use]
    pub fn tag<V: Into<BufValue>>(mut self, tag: &str, value: V) -> Self {
        if let [a, b] = tag.as_bytes() {
            self.tags.push((Tag::new(*a, *b), value.into()));
        }
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    /// Panics on an unparseable CIGAR, a zero start or a mapping quality of 255.
    #[must_use]
    pub fn build(self) -> RecordBuf {
        let mut record = RecordBuf::default();

        if let Some(name) = self.name {
            *record.name_mut() = Some(BString::from(name));
        }
        *record.flags_mut() = self.flags;
        *record.reference_sequence_id_mut() = self.reference_sequence_id;
        *record.alignment_start_mut() = self
            .alignment_start
            .map(|pos| Position::try_from(pos).expect("alignment_start must be >= 1"));
        *record.mapping_quality_mut() = self
            .mapping_quality
            .filter(|_| !self.flags.is_unmapped())
            .map(|mapq| MappingQuality::new(mapq).expect("mapping quality must not be 255"));

        let placed = self.alignment_start.is_some() && !self.flags.is_unmapped();
        let cigar = match self.cigar {
            Some(cigar) => Some(cigar),
            None if placed && !self.sequence.is_empty() => {
                Some(format!("{}M", self.sequence.len()))
            }
            None => None,
        };
        if let Some(cigar) = cigar {
            *record.cigar_mut() =
                parse_cigar(&cigar).expect("CIGAR must be valid").into_iter().collect();
        }

        let qualities = if self.qualities.is_empty() {
            vec![DEFAULT_BASE_QUALITY; self.sequence.len()]
        } else {
            self.qualities
        };
        *record.sequence_mut() = Sequence::from(self.sequence);
        *record.quality_scores_mut() = QualityScores::from(qualities);

        for (tag, value) in self.tags {
            record.data_mut().insert(tag, value);
        }
        record
    }
}

/// Builds a header with the given `(name, length)` references and optional `SO` sort order.
///
/// # Panics
/// Panics if a reference length is zero.
#[must_use]
pub fn header_with_references(references: &[(&str, usize)], sort_order: Option<&str>) -> Header {
    let mut builder = Header::builder();
    if let Some(so) = sort_order {
        let hd = Map::<map::Header>::builder()
            .insert(header_tag::SORT_ORDER, BString::from(so))
            .build()
            .expect("valid header record");
        builder = builder.set_header(hd);
    }
    for (name, length) in references {
        let length = NonZeroUsize::new(*length).expect("reference length must be > 0");
        builder = builder
            .add_reference_sequence(BString::from(*name), Map::<ReferenceSequence>::new(length));
    }
    builder.build()
}

/// Writes `records` to a BAM file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) -> Result<()> {
    let mut writer = create_bam_writer(path, header, 1, 1)?;
    for record in records {
        writer.write_alignment_record(header, record)?;
    }
    writer.into_inner().finish()?;
    Ok(())
}

/// Writes a FASTA file with one single-line record per `(name, bases)` pair.
///
/// # Errors
/// Returns an error if the temporary file cannot be created or written.
pub fn create_test_fasta(sequences: &[(&str, &str)]) -> std::io::Result<NamedTempFile> {
    use std::io::Write;

    let mut file = NamedTempFile::new()?;
    for (name, bases) in sequences {
        writeln!(file, ">{name}")?;
        writeln!(file, "{bases}")?;
    }
    file.flush()?;
    Ok(file)
}

/// FASTA with `chr1 = ACGTACGTACGT` and `chr2 = GGGGCCCCAAAA`.
///
/// # Errors
/// Returns an error if the temporary file cannot be created or written.
pub fn create_default_test_fasta() -> std::io::Result<NamedTempFile> {
    create_test_fasta(&[("chr1", "ACGTACGTACGT"), ("chr2", "GGGGCCCCAAAA")])
}
