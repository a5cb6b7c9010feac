//! Error path integration tests.
//!
//! These tests verify that invalid configuration, missing files and inconsistent read sets are
//! reported as errors, by the library and by the binary.

use std::process::Command;

use fgrealign_lib::errors::RealignError;
use fgrealign_lib::model::cigar::parse_cigar;
use fgrealign_lib::model::{AlignedRead, IndexedRead};
use fgrealign_lib::realign::{ConsensusGenerator, IndelRealigner, KnownSites, RealignmentConfig, merge};
use fgrealign_lib::reference::ReferenceReader;
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{insertion_scenario, write_input_bam};

// ==================== Configuration ====================

#[rstest]
#[case::zero_indel_size(RealignmentConfig { max_indel_size: 0, ..Default::default() }, "max-indel-size")]
#[case::zero_consensus_number(RealignmentConfig { max_consensus_number: 0, ..Default::default() }, "max-consensus-number")]
#[case::zero_target_size(RealignmentConfig { max_target_size: 0, ..Default::default() }, "max-target-size")]
#[case::negative_lod(RealignmentConfig { lod_threshold: -1.0, ..Default::default() }, "lod-threshold")]
#[case::nan_lod(RealignmentConfig { lod_threshold: f64::NAN, ..Default::default() }, "lod-threshold")]
fn test_invalid_config_rejected(#[case] config: RealignmentConfig, #[case] parameter: &str) {
    let err = IndelRealigner::new(config, ConsensusGenerator::FromReads).unwrap_err();
    assert!(
        matches!(&err, RealignError::InvalidParameter { parameter: p, .. } if p == parameter),
        "unexpected error: {err}"
    );
}

// ==================== Merge ====================

fn read(name: &str) -> AlignedRead {
    AlignedRead::mapped(name, "chr1", 0, parse_cigar("4M").unwrap(), "ACGT", vec![30; 4])
}

#[test]
fn test_merge_detects_lost_read() {
    let reads = vec![IndexedRead::new(0, read("a")), IndexedRead::new(2, read("c"))];
    let err = merge(3, reads).unwrap_err();
    assert!(matches!(err, RealignError::CardinalityMismatch { expected: 3, .. }));
}

#[test]
fn test_merge_detects_duplicated_read() {
    let reads = vec![
        IndexedRead::new(0, read("a")),
        IndexedRead::new(1, read("b")),
        IndexedRead::new(1, read("b")),
    ];
    assert!(matches!(merge(3, reads), Err(RealignError::CardinalityMismatch { .. })));
}

// ==================== Files ====================

#[test]
fn test_missing_reference_file() {
    let result = ReferenceReader::new("/nonexistent/ref.fa");
    assert!(result.is_err());
}

#[test]
fn test_missing_known_sites_file() {
    assert!(KnownSites::from_path("/nonexistent/sites.tsv").is_err());
}

#[test]
fn test_known_sites_with_bad_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sites.tsv");
    std::fs::write(&path, "contig\tposition\tref\talt\nchr1\tnot-a-number\tA\tAC\n").unwrap();
    assert!(KnownSites::from_path(&path).is_err());
}

// ==================== Command line ====================

#[test]
fn test_realign_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.bam");
    let result = Command::new(env!("CARGO_BIN_EXE_fgrealign"))
        .args(["realign", "-i", "/nonexistent/in.bam", "-o", output.to_str().unwrap()])
        .output()
        .expect("Failed to run realign command");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("/nonexistent/in.bam"));
    assert!(!output.exists());
}

#[test]
fn test_realign_invalid_parameter_fails() {
    let temp_dir = TempDir::new().unwrap();
    let records: Vec<_> = insertion_scenario().iter().map(|s| s.to_record(false)).collect();
    let input = write_input_bam(temp_dir.path(), "input.bam", &records, Some("coordinate"));
    let output = temp_dir.path().join("out.bam");
    let result = Command::new(env!("CARGO_BIN_EXE_fgrealign"))
        .args([
            "realign",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--max-consensus-number",
            "0",
        ])
        .output()
        .expect("Failed to run realign command");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("max-consensus-number"));
    assert!(!output.exists());
}

#[test]
fn test_targets_missing_known_sites_fails() {
    let temp_dir = TempDir::new().unwrap();
    let records: Vec<_> = insertion_scenario().iter().map(|s| s.to_record(false)).collect();
    let input = write_input_bam(temp_dir.path(), "input.bam", &records, None);
    let output = temp_dir.path().join("targets.txt");
    let status = Command::new(env!("CARGO_BIN_EXE_fgrealign"))
        .args([
            "targets",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--known-sites",
            "/nonexistent/sites.tsv",
        ])
        .status()
        .expect("Failed to run targets command");
    assert!(!status.success());
}
