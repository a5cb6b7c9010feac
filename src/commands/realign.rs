//! `Realign` command implementation.
//!
//! Realigns reads around insertions and deletions and writes every input record back out,
//! moving only the reads whose alignment improves on a candidate consensus.

use anyhow::Result;
use clap::Parser;
use log::info;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use std::path::PathBuf;

use fgrealign_lib::bam_io::{create_bam_reader, create_bam_writer, is_coordinate_sorted};
use fgrealign_lib::header::{add_pg_record, reference_names};
use fgrealign_lib::logging::{OperationTimer, log_realignment_summary};
use fgrealign_lib::metrics::writer::write_metrics_auto;
use fgrealign_lib::metrics::{RealignmentMetrics, format_count};
use fgrealign_lib::realign::{IndelRealigner, ReferenceSource};
use fgrealign_lib::sam::{apply_realignment, record_to_read};
use fgrealign_lib::validation::validate_output_parent;

use super::command::Command;
use super::common::{
    BamIoOptions, CompressionOptions, RealignmentOptions, ThreadingOptions, for_each_batch,
};

/// Realigns reads around indels
#[derive(Parser, Debug)]
#[command(
    name = "realign",
    about = "\x1b[38;5;173m[REALIGN]\x1b[0m \x1b[36mRealign reads around insertions and deletions\x1b[0m",
    long_about = r#"
Locally realigns reads around insertions and deletions.

Mapped reads that carry an indel, and the reads overlapping them, are clustered into target
regions. For each region a set of candidate consensus haplotypes is built, either from the indels
observed in the reads or, with --known-sites, from a table of known indels. Every read in the
region is then scored against the reference and against each candidate, and a read is moved onto
the best candidate when that improves its log10 odds by more than --lod-threshold.

Realigned records get a new position, CIGAR, MD and NM; their previous position and CIGAR are
kept in the OP and OC tags. All other records are written unchanged and in input order.

Without --ref the reference for each region is rebuilt from the MD tags of its reads; regions
that the MD tags do not fully cover are left unchanged.

Coordinate-sorted input (SO:coordinate, or --assume-sorted) is processed one reference at a time.
Other input is loaded into memory in full.
"#
)]
pub struct Realign {
    /// Input/output BAM options
    #[command(flatten)]
    pub io: BamIoOptions,

    /// Realignment parameters
    #[command(flatten)]
    pub options: RealignmentOptions,

    /// Output file for the run summary metrics
    #[arg(short = 'm', long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Output file with one row per target region
    #[arg(long = "targets")]
    pub targets: Option<PathBuf>,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Compression options for output
    #[command(flatten)]
    pub compression: CompressionOptions,
}

impl Command for Realign {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.io.validate()?;
        self.options.validate_files()?;
        self.compression.validate()?;
        if let Some(path) = &self.metrics {
            validate_output_parent(path, "Metrics output")?;
        }
        if let Some(path) = &self.targets {
            validate_output_parent(path, "Targets output")?;
        }

        info!("Realign");
        info!("  Input: {}", self.io.input.display());
        info!("  Output: {}", self.io.output.display());
        self.options.log();
        info!("  {}", self.threading.log_message());

        let timer = OperationTimer::new("Realigning reads", "records");
        let threads = self.threading.num_threads();

        let (mut reader, header) = create_bam_reader(&self.io.input, threads)?;
        let names = reference_names(&header);
        let sorted = self.options.assume_sorted || is_coordinate_sorted(&header);
        if sorted {
            info!("Input is coordinate sorted, realigning one reference at a time");
        } else {
            info!("Input is not coordinate sorted, loading all records");
        }

        let realigner =
            IndelRealigner::new(self.options.config(sorted)?, self.options.generator()?)?;
        let reference = self.options.load_reference()?;
        let source = reference.as_ref().map(|r| r as &dyn ReferenceSource);
        let pool = self.threading.build_pool()?;

        let output_header =
            add_pg_record(header.clone(), crate::version::VERSION.as_str(), command_line)?;
        let mut writer = create_bam_writer(
            &self.io.output,
            &output_header,
            threads,
            self.compression.compression_level,
        )?;

        let mut metrics = RealignmentMetrics::default();
        let mut regions = Vec::new();
        let mut records_changed: u64 = 0;

        let total_records = for_each_batch(&mut reader, &header, &names, sorted, |mut records| {
            let reads: Vec<_> =
                records.iter().map(|record| record_to_read(record, &names)).collect();
            let output = pool.install(|| realigner.realign(reads, source))?;

            for (record, read) in records.iter_mut().zip(&output.reads) {
                if apply_realignment(record, read)? {
                    records_changed += 1;
                }
                writer.write_alignment_record(&output_header, record)?;
            }
            metrics.merge(&output.metrics);
            regions.extend(output.regions);
            Ok(())
        })?;
        writer.into_inner().finish()?;

        info!(
            "Wrote {} records, {} realigned",
            format_count(total_records),
            format_count(records_changed)
        );
        log_realignment_summary(&metrics);

        if let Some(path) = &self.metrics {
            write_metrics_auto(path, &[metrics])?;
            info!("Wrote realignment metrics to {}", path.display());
        }
        if let Some(path) = &self.targets {
            write_metrics_auto(path, &regions)?;
            info!(
                "Wrote {} target regions to {}",
                format_count(regions.len() as u64),
                path.display()
            );
        }

        timer.log_completion(total_records);
        Ok(())
    }
}
