//! CLI options and input plumbing shared by the realignment commands.
//!
//! Option groups are composed into commands with `#[command(flatten)]`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use log::{info, warn};
use noodles::sam::Header;
use noodles::sam::alignment::record_buf::RecordBuf;

use fgrealign_lib::bam_io::BamReaderAuto;
use fgrealign_lib::errors::RealignError;
use fgrealign_lib::progress::ProgressTracker;
use fgrealign_lib::realign::config::{
    DEFAULT_LOD_THRESHOLD, DEFAULT_MAX_CONSENSUS_NUMBER, DEFAULT_MAX_INDEL_SIZE,
    DEFAULT_MAX_TARGET_SIZE,
};
use fgrealign_lib::realign::{ConsensusGenerator, KnownSites, RealignmentConfig};
use fgrealign_lib::reference::ReferenceReader;
use fgrealign_lib::sam::locate;
use fgrealign_lib::validation::{validate_file_exists, validate_in_range, validate_output_parent};

/// Input BAM and output path.
#[derive(Debug, Clone, Args)]
pub struct BamIoOptions {
    /// Input BAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

impl BamIoOptions {
    /// Checks that the input exists and the output directory does.
    ///
    /// # Errors
    /// Returns an error naming the offending path.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        validate_output_parent(&self.output, "Output")?;
        Ok(())
    }
}

/// Engine parameters and candidate sources.
#[derive(Debug, Clone, Args)]
pub struct RealignmentOptions {
    /// Reference FASTA; without it region references are rebuilt from MD tags
    #[arg(short = 'r', long = "ref")]
    pub reference: Option<PathBuf>,

    /// Known indels (TSV with columns contig, position, ref, alt); switches candidate
    /// generation from observed indels to these sites
    #[arg(short = 'k', long = "known-sites")]
    pub known_sites: Option<PathBuf>,

    /// Treat the input as coordinate sorted even if the header does not say so
    #[arg(long = "assume-sorted", default_value_t = false)]
    pub assume_sorted: bool,

    /// Largest indel used as evidence or as a candidate
    #[arg(long = "max-indel-size", default_value_t = DEFAULT_MAX_INDEL_SIZE)]
    pub max_indel_size: usize,

    /// Maximum number of candidate consensuses per target region
    #[arg(long = "max-consensus-number", default_value_t = DEFAULT_MAX_CONSENSUS_NUMBER)]
    pub max_consensus_number: usize,

    /// Minimum log10 improvement needed to move a read
    #[arg(long = "lod-threshold", default_value_t = DEFAULT_LOD_THRESHOLD)]
    pub lod_threshold: f64,

    /// Widest target region
    #[arg(long = "max-target-size", default_value_t = DEFAULT_MAX_TARGET_SIZE)]
    pub max_target_size: usize,
}

impl RealignmentOptions {
    /// Builds the engine configuration; `is_sorted` reflects the input header or
    /// `--assume-sorted`.
    ///
    /// # Errors
    /// Returns an error if a parameter is out of range.
    pub fn config(&self, is_sorted: bool) -> Result<RealignmentConfig> {
        let config = RealignmentConfig {
            is_sorted,
            max_indel_size: self.max_indel_size,
            max_consensus_number: self.max_consensus_number,
            lod_threshold: self.lod_threshold,
            max_target_size: self.max_target_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the reference and known-sites files exist.
    ///
    /// # Errors
    /// Returns an error naming the missing file.
    pub fn validate_files(&self) -> Result<()> {
        if let Some(path) = &self.reference {
            validate_file_exists(path, "Reference FASTA")?;
        }
        if let Some(path) = &self.known_sites {
            validate_file_exists(path, "Known sites")?;
        }
        Ok(())
    }

    /// Loads the reference FASTA, if one was given.
    ///
    /// # Errors
    /// Returns an error if the FASTA cannot be read.
    pub fn load_reference(&self) -> Result<Option<ReferenceReader>> {
        self.reference
            .as_ref()
            .map(|path| -> Result<ReferenceReader> {
                info!("Loading reference from {}", path.display());
                let reference = ReferenceReader::new(path)?;
                if reference.is_empty() {
                    warn!("Reference {} holds no sequences", path.display());
                } else {
                    info!("Loaded {} reference sequences", reference.len());
                }
                Ok(reference)
            })
            .transpose()
    }

    /// Chooses the candidate strategy: known sites when given, observed indels otherwise.
    ///
    /// # Errors
    /// Returns an error if the known-sites file cannot be read.
    pub fn generator(&self) -> Result<ConsensusGenerator> {
        match &self.known_sites {
            Some(path) => {
                Ok(ConsensusGenerator::FromKnownSites(Arc::new(KnownSites::from_path(path)?)))
            }
            None => Ok(ConsensusGenerator::FromReads),
        }
    }

    /// Logs the parameters.
    pub fn log(&self) {
        if let Some(path) = &self.reference {
            info!("  Reference: {}", path.display());
        }
        if let Some(path) = &self.known_sites {
            info!("  Known sites: {}", path.display());
        }
        info!("  Max indel size: {}", self.max_indel_size);
        info!("  Max consensus number: {}", self.max_consensus_number);
        info!("  LOD threshold: {}", self.lod_threshold);
        info!("  Max target size: {}", self.max_target_size);
    }
}

/// Worker thread count.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Threads for BGZF (de)compression and per-region realignment
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl ThreadingOptions {
    /// Thread count, at least one.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.threads.max(1)
    }

    /// Builds the rayon pool that runs per-region work.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created.
    pub fn build_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads())
            .thread_name(|i| format!("fgrealign-worker-{i}"))
            .build()
            .context("Failed to build thread pool")
    }

    /// Describes the threading configuration for the log.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self.num_threads() {
            1 => "Single-threaded mode".to_string(),
            n => format!("Using {n} threads"),
        }
    }
}

/// BGZF compression level for BAM output.
#[derive(Debug, Clone, Args)]
pub struct CompressionOptions {
    /// Compression level for output BAM (0-9)
    #[arg(long = "compression-level", default_value_t = 5)]
    pub compression_level: u32,
}

impl CompressionOptions {
    /// Checks the level is one BGZF accepts.
    ///
    /// # Errors
    /// Returns an error if the level is above 9.
    pub fn validate(&self) -> Result<()> {
        validate_in_range(self.compression_level, 0, 9, "compression-level")?;
        Ok(())
    }
}

/// Reads every record of `reader`, handing them to `process` in batches.
///
/// For sorted input each batch holds one reference's records (unplaced records form the last
/// batch); otherwise the whole file is one batch. A batch is held in memory until `process`
/// returns. Returns the number of records read.
///
/// # Errors
/// Returns an error if a record cannot be read, if sorted input revisits a reference, or if
/// `process` fails.
pub fn for_each_batch<F>(
    reader: &mut BamReaderAuto,
    header: &Header,
    reference_names: &[String],
    sorted: bool,
    mut process: F,
) -> Result<u64>
where
    F: FnMut(Vec<RecordBuf>) -> Result<()>,
{
    let progress = ProgressTracker::new("Read records");
    let mut finished: HashSet<Option<usize>> = HashSet::new();
    let mut current: Option<Option<usize>> = None;
    let mut batch: Vec<RecordBuf> = Vec::new();

    for result in reader.record_bufs(header) {
        let record = result.context("Failed to read BAM record")?;

        if sorted {
            let reference_id = record.reference_sequence_id();
            if current != Some(reference_id) {
                if finished.contains(&reference_id) {
                    let position = record.alignment_start().map_or(0, |p| usize::from(p) - 1);
                    bail!(RealignError::InputNotSorted {
                        read_name: record.name().map(ToString::to_string).unwrap_or_default(),
                        ref_name: reference_id
                            .and_then(|id| reference_names.get(id))
                            .cloned()
                            .unwrap_or_else(|| "*".to_string()),
                        position,
                        previous: "a later reference".to_string(),
                    });
                }
                if let Some(previous) = current.replace(reference_id) {
                    finished.insert(previous);
                    process(std::mem::take(&mut batch))?;
                }
            }
        }

        progress.add_at(1, || locate(&record, reference_names));
        batch.push(record);
    }

    if !batch.is_empty() {
        process(batch)?;
    }
    progress.finish();
    Ok(progress.count())
}
