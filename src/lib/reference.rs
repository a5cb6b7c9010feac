//! Reference FASTA loading.
//!
//! The whole reference is read into memory once so that each target region's window is a slice
//! copy. When a `.fai` index sits next to the FASTA, sequences are read as raw bytes at the
//! indexed offsets; otherwise the file is parsed record by record with noodles.

use crate::errors::RealignError;
use crate::realign::ReferenceSource;
use anyhow::{Context, Result};
use log::debug;
use noodles::fasta::fai;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads one sequence's bytes at the offset given by its FAI record, dropping line terminators.
fn read_sequence_raw(file: &mut File, record: &fai::Record) -> Result<Vec<u8>> {
    let line_bases = usize::try_from(record.line_bases())?;
    let line_width = usize::try_from(record.line_width())?;
    let length = usize::try_from(record.length())?;

    file.seek(SeekFrom::Start(record.offset()))?;

    if length <= line_bases || line_bases == 0 {
        let mut sequence = vec![0u8; length];
        file.read_exact(&mut sequence)?;
        return Ok(sequence);
    }

    // every full line but the last carries a terminator
    let full_lines = length / line_bases;
    let tail = length % line_bases;
    let total_bytes = if tail > 0 {
        full_lines * line_width + tail
    } else {
        (full_lines - 1) * line_width + line_bases
    };

    let mut raw = vec![0u8; total_bytes];
    file.read_exact(&mut raw)?;

    let mut sequence = Vec::with_capacity(length);
    for line in raw.chunks(line_width) {
        let take = line.len().min(line_bases).min(length - sequence.len());
        sequence.extend_from_slice(&line[..take]);
    }
    Ok(sequence)
}

/// Returns the `.fai` index path for a FASTA, if one exists.
fn find_fai_path(fasta_path: &Path) -> Option<PathBuf> {
    let appended = PathBuf::from(format!("{}.fai", fasta_path.display()));
    if appended.exists() {
        return Some(appended);
    }
    let replaced = fasta_path.with_extension("fa.fai");
    replaced.exists().then_some(replaced)
}

/// An in-memory reference genome, cheap to clone and share across threads.
#[derive(Clone, Debug)]
pub struct ReferenceReader {
    sequences: Arc<HashMap<String, Vec<u8>>>,
}

impl ReferenceReader {
    /// Loads every sequence of the FASTA at `path`.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or cannot be parsed.
    ///
    /// # Examples
    /// ```no_run
    /// use fgrealign_lib::reference::ReferenceReader;
    ///
    /// let reference = ReferenceReader::new("reference.fasta")?;
    /// let bases = reference.fetch("chr1", 0, 100)?;
    /// assert_eq!(bases.len(), 100);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RealignError::InvalidFileFormat {
                file_type: "Reference FASTA".to_string(),
                path: path.display().to_string(),
                reason: "File does not exist".to_string(),
            }
            .into());
        }

        debug!("Reading reference FASTA into memory: {}", path.display());
        let sequences = match find_fai_path(path) {
            Some(fai_path) => {
                debug!("Using FAI index: {}", fai_path.display());
                Self::load_indexed(path, &fai_path)?
            }
            None => Self::load_sequential(path)?,
        };
        debug!("Loaded {} contigs into memory", sequences.len());

        Ok(Self { sequences: Arc::new(sequences) })
    }

    fn load_indexed(fasta_path: &Path, fai_path: &Path) -> Result<HashMap<String, Vec<u8>>> {
        let index = fai::fs::read(fai_path)
            .with_context(|| format!("Failed to read FAI index: {}", fai_path.display()))?;
        let records: &[fai::Record] = index.as_ref();
        let mut file = File::open(fasta_path)
            .with_context(|| format!("Failed to open FASTA: {}", fasta_path.display()))?;

        let mut sequences = HashMap::with_capacity(records.len());
        for record in records {
            let name = String::from_utf8_lossy(record.name().as_ref()).into_owned();
            let bases = read_sequence_raw(&mut file, record)
                .with_context(|| format!("Failed to read sequence '{name}'"))?;
            sequences.insert(name, bases);
        }
        Ok(sequences)
    }

    fn load_sequential(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
        use noodles::fasta;

        let mut reader = fasta::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open FASTA: {}", path.display()))?;

        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record =
                result.with_context(|| format!("Failed to parse FASTA: {}", path.display()))?;
            let name = std::str::from_utf8(record.name())?.to_string();
            let bases: &[u8] = record.sequence().as_ref();
            sequences.insert(name, bases.to_vec());
        }
        Ok(sequences)
    }

    /// Number of loaded sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// True if the FASTA held no sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Returns bases `[start, end)` (0-based) of `name`, preserving FASTA case.
    ///
    /// # Errors
    /// Returns an error if the sequence is unknown or the interval runs past its end.
    pub fn fetch(&self, name: &str, start: usize, end: usize) -> Result<Vec<u8>> {
        let sequence = self
            .sequences
            .get(name)
            .ok_or_else(|| RealignError::ReferenceNotFound { ref_name: name.to_string() })?;

        sequence.get(start..end).map(<[u8]>::to_vec).ok_or_else(|| {
            RealignError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!(
                    "{name}:{start}-{end} is outside the sequence (length {})",
                    sequence.len()
                ),
            }
            .into()
        })
    }
}

impl ReferenceSource for ReferenceReader {
    fn fetch(&self, reference_name: &str, start: usize, end: usize) -> Option<Vec<u8>> {
        self.sequences.get(reference_name)?.get(start..end).map(<[u8]>::to_vec)
    }
}
