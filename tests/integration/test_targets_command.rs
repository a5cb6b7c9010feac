//! End-to-end CLI tests for the targets command.

use std::process::Command;

use fgoxide::io::DelimFile;
use fgrealign_lib::metrics::TargetRegionMetric;
use tempfile::TempDir;

use crate::helpers::{
    CHR1, INSERTION_POS, ReadSpec, insertion_scenario, write_input_bam, write_reference,
};

#[test]
fn test_targets_lists_regions_without_realigning() {
    let temp_dir = TempDir::new().unwrap();
    let mut specs = insertion_scenario();
    // A second, isolated deletion read further along chr1
    let deleted = format!("{}{}", &CHR1[98..108], &CHR1[110..120]);
    specs.push(ReadSpec::new("del", 98, "10M2D10M", &deleted, 30));
    let records: Vec<_> = specs.iter().map(|s| s.to_record(false)).collect();
    let input = write_input_bam(temp_dir.path(), "input.bam", &records, Some("coordinate"));
    let reference = write_reference(temp_dir.path());
    let output = temp_dir.path().join("targets.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_fgrealign"))
        .args([
            "targets",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--ref",
            reference.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to run targets command");
    assert!(status.success(), "targets command failed");

    let regions: Vec<TargetRegionMetric> = DelimFile::default().read_tsv(&output).unwrap();
    assert_eq!(regions.len(), 2);

    assert_eq!((regions[0].start, regions[0].end), (30, 85));
    assert_eq!(regions[0].reads, 12);
    assert_eq!(regions[0].indel_reads, 9);
    assert_eq!(regions[0].candidates, 1);
    assert_eq!(regions[0].reads_realigned, 0);
    assert!(regions[0].start < INSERTION_POS && INSERTION_POS < regions[0].end);

    assert_eq!((regions[1].contig.as_str(), regions[1].start, regions[1].end), ("chr1", 98, 120));
    assert_eq!(regions[1].reads, 1);
    assert_eq!(regions[1].candidates, 1);
}

#[test]
fn test_targets_with_known_sites_outside_every_region() {
    let temp_dir = TempDir::new().unwrap();
    let records: Vec<_> = insertion_scenario().iter().map(|s| s.to_record(false)).collect();
    let input = write_input_bam(temp_dir.path(), "input.bam", &records, Some("coordinate"));
    let sites = temp_dir.path().join("sites.tsv");
    let anchor = &CHR1[99..100];
    let table = format!("contig\tposition\tref\talt\nchr1\t100\t{anchor}\t{anchor}AC\n");
    std::fs::write(&sites, table).unwrap();
    let output = temp_dir.path().join("targets.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_fgrealign"))
        .args([
            "targets",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--known-sites",
            sites.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to run targets command");
    assert!(status.success(), "targets command failed");

    let regions: Vec<TargetRegionMetric> = DelimFile::default().read_tsv(&output).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].candidates, 0);
}
