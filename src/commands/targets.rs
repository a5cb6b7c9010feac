//! `Targets` command implementation.
//!
//! Reports the target regions that `realign` would visit, without changing any reads.

use anyhow::Result;
use clap::Parser;
use log::info;

use fgrealign_lib::bam_io::{create_bam_reader, is_coordinate_sorted};
use fgrealign_lib::header::reference_names;
use fgrealign_lib::logging::{OperationTimer, log_realignment_summary};
use fgrealign_lib::metrics::writer::write_metrics_auto;
use fgrealign_lib::metrics::{RealignmentMetrics, format_count};
use fgrealign_lib::realign::{IndelRealigner, ReferenceSource};
use fgrealign_lib::sam::record_to_read;

use super::command::Command;
use super::common::{BamIoOptions, RealignmentOptions, ThreadingOptions, for_each_batch};

/// Lists realignment target regions
#[derive(Parser, Debug)]
#[command(
    name = "targets",
    about = "\x1b[38;5;173m[REALIGN]\x1b[0m \x1b[36mList indel realignment target regions\x1b[0m",
    long_about = r#"
Scans a BAM file for indel realignment target regions and writes one row per region.

Regions are found exactly as `realign` finds them, with the same parameters. For each region the
output reports its span (0-based, half-open), the number of reads in it, how many of them carry an
indel, and how many candidate consensuses were built for it. No reads are scored or moved, so the
`reads_realigned` and `max_log_odds` columns are always zero.
"#
)]
pub struct Targets {
    /// Input BAM and output TSV
    #[command(flatten)]
    pub io: BamIoOptions,

    /// Realignment parameters
    #[command(flatten)]
    pub options: RealignmentOptions,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for Targets {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.io.validate()?;
        self.options.validate_files()?;

        info!("Targets");
        info!("  Input: {}", self.io.input.display());
        info!("  Output: {}", self.io.output.display());
        self.options.log();
        info!("  {}", self.threading.log_message());

        let timer = OperationTimer::new("Scanning reads", "records");

        let (mut reader, header) = create_bam_reader(&self.io.input, self.threading.num_threads())?;
        let names = reference_names(&header);
        let sorted = self.options.assume_sorted || is_coordinate_sorted(&header);

        let realigner =
            IndelRealigner::new(self.options.config(sorted)?, self.options.generator()?)?;
        let reference = self.options.load_reference()?;
        let source = reference.as_ref().map(|r| r as &dyn ReferenceSource);
        let pool = self.threading.build_pool()?;

        let mut metrics = RealignmentMetrics::default();
        let mut regions = Vec::new();
        let total_records = for_each_batch(&mut reader, &header, &names, sorted, |records| {
            let reads: Vec<_> =
                records.iter().map(|record| record_to_read(record, &names)).collect();
            let (batch_regions, batch_metrics) =
                pool.install(|| realigner.describe_targets(reads, source))?;
            metrics.merge(&batch_metrics);
            regions.extend(batch_regions);
            Ok(())
        })?;

        log_realignment_summary(&metrics);
        write_metrics_auto(&self.io.output, &regions)?;
        info!(
            "Wrote {} target regions to {}",
            format_count(regions.len() as u64),
            self.io.output.display()
        );

        timer.log_completion(total_records);
        Ok(())
    }
}
