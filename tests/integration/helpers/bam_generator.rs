//! Test data: a small reference with a 3-base insertion haplotype, reads drawn from it, and the
//! BAM/FASTA files the command tests run on.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fgrealign_lib::bam_io::create_bam_reader;
use fgrealign_lib::model::AlignedRead;
use fgrealign_lib::model::cigar::parse_cigar;
use fgrealign_lib::realign::ReferenceSource;
use fgrealign_lib::realign::md::compute_md_and_nm;
use fgrealign_lib::sam::builder::{RecordBuilder, header_with_references, write_bam};
use noodles::sam::Header;
use noodles::sam::alignment::record_buf::RecordBuf;

/// `chr1` of the test reference.
pub const CHR1: &str = "CAGATTTTCATATTATGCAGAAAATCTACTTCGCCTGATACGAGTCGGTTATCTTCGGATACTGTATAGTCCCACCTGGTGATCCTATGCTTGTGAGTACCCAGAAAATAGCGACGGACC";

/// 0-based reference position the haplotype insertion precedes.
pub const INSERTION_POS: usize = 50;

/// Bases inserted by the haplotype.
pub const INSERTED: &str = "TGA";

/// `chr1` carrying [`INSERTED`] before [`INSERTION_POS`].
pub fn haplotype() -> String {
    format!("{}{INSERTED}{}", &CHR1[..INSERTION_POS], &CHR1[INSERTION_POS..])
}

/// A read as `(name, 0-based start, CIGAR, bases, base quality)`.
#[derive(Debug, Clone)]
pub struct ReadSpec {
    pub name: String,
    pub start: usize,
    pub cigar: String,
    pub bases: String,
    pub quality: u8,
}

impl ReadSpec {
    pub fn new(name: &str, start: usize, cigar: &str, bases: &str, quality: u8) -> Self {
        Self {
            name: name.to_string(),
            start,
            cigar: cigar.to_string(),
            bases: bases.to_string(),
            quality,
        }
    }

    /// The read on `chr1` as an engine read, with MD and NM computed against [`CHR1`].
    pub fn to_read(&self) -> AlignedRead {
        let cigar = parse_cigar(&self.cigar).expect("valid CIGAR");
        let (md, nm) =
            compute_md_and_nm(self.bases.as_bytes(), &cigar, &CHR1.as_bytes()[self.start..]);
        AlignedRead::mapped(
            self.name.as_str(),
            "chr1",
            self.start,
            cigar,
            self.bases.as_bytes(),
            vec![self.quality; self.bases.len()],
        )
        .with_md(Some(md))
        .with_edit_distance(Some(nm))
    }

    /// The read as a BAM record on reference 0, optionally with MD and NM tags.
    pub fn to_record(&self, with_md: bool) -> RecordBuf {
        let mut builder = RecordBuilder::new()
            .name(&self.name)
            .sequence(&self.bases)
            .qualities(&vec![self.quality; self.bases.len()])
            .reference_sequence_id(0)
            .alignment_start(self.start + 1)
            .cigar(&self.cigar)
            .tag("RG", "A");
        if with_md {
            let read = self.to_read();
            let md = read.md().expect("MD computed").to_string();
            let nm = i32::try_from(read.edit_distance().expect("NM computed")).expect("small NM");
            builder = builder.tag("MD", md).tag("NM", nm);
        }
        builder.build()
    }
}

/// Twelve reads over the insertion: nine aligned with the insertion, one (`mis`) carrying the
/// inserted bases but aligned without a gap, and two reference reads.
pub fn insertion_scenario() -> Vec<ReadSpec> {
    let hap = haplotype();
    let mut reads: Vec<ReadSpec> = (30..=38)
        .map(|start| {
            let before = INSERTION_POS - start;
            let cigar = format!("{before}M3I{}M", 37 - before);
            ReadSpec::new(&format!("ins{start}"), start, &cigar, &hap[start..start + 40], 30)
        })
        .collect();
    reads.insert(6, ReadSpec::new("mis", 35, "40M", &hap[35..75], 30));
    reads.push(ReadSpec::new("ref1", 40, "40M", &CHR1[40..80], 30));
    reads.push(ReadSpec::new("ref2", 45, "40M", &CHR1[45..85], 30));
    reads
}

/// In-memory reference.
pub struct MapReference(pub HashMap<String, Vec<u8>>);

impl MapReference {
    /// The test reference holding only `chr1`.
    pub fn chr1() -> Self {
        Self(HashMap::from([("chr1".to_string(), CHR1.as_bytes().to_vec())]))
    }
}

impl ReferenceSource for MapReference {
    fn fetch(&self, name: &str, start: usize, end: usize) -> Option<Vec<u8>> {
        self.0.get(name).and_then(|seq| seq.get(start..end)).map(<[u8]>::to_vec)
    }
}

/// Header with `chr1` of length `CHR1.len()` and the given sort order.
pub fn chr1_header(sort_order: Option<&str>) -> Header {
    header_with_references(&[("chr1", CHR1.len())], sort_order)
}

/// Writes `records` to `dir/name` and returns the path.
pub fn write_input_bam(
    dir: &Path,
    name: &str,
    records: &[RecordBuf],
    sort_order: Option<&str>,
) -> PathBuf {
    let path = dir.join(name);
    write_bam(&path, &chr1_header(sort_order), records).expect("Failed to write input BAM");
    path
}

/// Writes the test reference FASTA to `dir/ref.fa` and returns the path.
pub fn write_reference(dir: &Path) -> PathBuf {
    let path = dir.join("ref.fa");
    std::fs::write(&path, format!(">chr1\n{CHR1}\n")).expect("Failed to write reference");
    path
}

/// Reads every record of a BAM file.
pub fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let (mut reader, header) = create_bam_reader(path, 1).expect("Failed to open BAM");
    let records = reader
        .record_bufs(&header)
        .collect::<std::io::Result<Vec<_>>>()
        .expect("Failed to read BAM records");
    (header, records)
}
