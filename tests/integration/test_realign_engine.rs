//! End-to-end realignment scenarios run through [`IndelRealigner`].

use std::sync::Arc;

use fgrealign_lib::errors::RealignError;
use fgrealign_lib::model::cigar::{cigar_to_string, parse_cigar};
use fgrealign_lib::model::{AlignedRead, IndexedRead, ReferenceRegion};
use fgrealign_lib::realign::{
    ConsensusGenerator, IndelRealigner, KnownSiteRecord, KnownSites, RealignmentConfig,
    RealignmentOutput,
};

use crate::helpers::{CHR1, INSERTION_POS, MapReference, ReadSpec, haplotype, insertion_scenario};

fn realign(reads: Vec<AlignedRead>, config: RealignmentConfig) -> RealignmentOutput {
    IndelRealigner::new(config, ConsensusGenerator::FromReads)
        .unwrap()
        .realign(reads, Some(&MapReference::chr1()))
        .unwrap()
}

fn reads_of(specs: &[ReadSpec]) -> Vec<AlignedRead> {
    specs.iter().map(ReadSpec::to_read).collect()
}

fn index_of(specs: &[ReadSpec], name: &str) -> usize {
    specs.iter().position(|s| s.name == name).unwrap()
}

/// The misaligned read moves onto the insertion shared by the majority; the reads already
/// aligned with the insertion and the two reference reads keep their alignments.
#[test]
fn test_majority_insertion_realigns_misaligned_read() {
    let specs = insertion_scenario();
    let input = reads_of(&specs);
    let output = realign(input.clone(), RealignmentConfig::default());

    assert_eq!(output.reads.len(), input.len());
    let mis = index_of(&specs, "mis");
    for (i, (before, after)) in input.iter().zip(&output.reads).enumerate() {
        if i == mis {
            continue;
        }
        assert_eq!(after, before, "read {} changed", before.name());
    }

    let moved = &output.reads[mis];
    assert_eq!(moved.start(), Some(35));
    assert_eq!(cigar_to_string(moved.cigar()), "15M3I22M");
    assert_eq!(moved.md(), Some("37"));
    assert_eq!(moved.edit_distance(), Some(3));
    let (original_start, original_cigar) = moved.original_alignment().unwrap();
    assert_eq!(original_start, 35);
    assert_eq!(cigar_to_string(original_cigar), "40M");

    assert_eq!(output.metrics.total_reads, 12);
    assert_eq!(output.metrics.regions_processed, 1);
    assert_eq!(output.metrics.reads_in_regions, 12);
    assert_eq!(output.metrics.reads_realigned, 1);
    assert_eq!(output.metrics.candidates_considered, 1);

    let region = &output.regions[0];
    assert_eq!((region.contig.as_str(), region.start, region.end), ("chr1", 30, 85));
    assert_eq!(region.reads, 12);
    assert_eq!(region.indel_reads, 9);
    assert_eq!(region.reads_realigned, 1);
    assert!((region.max_log_odds - 60.0).abs() < 1e-9);
}

/// Without a FASTA the region reference is rebuilt from MD tags, which cover the whole region
/// here, so the outcome matches the FASTA run.
#[test]
fn test_md_reconstruction_matches_fasta_reference() {
    let input = reads_of(&insertion_scenario());
    let realigner =
        IndelRealigner::new(RealignmentConfig::default(), ConsensusGenerator::FromReads).unwrap();
    let from_md = realigner.realign(input.clone(), None).unwrap();
    let from_fasta = realigner.realign(input, Some(&MapReference::chr1())).unwrap();

    assert_eq!(from_md.reads, from_fasta.reads);
    assert_eq!(from_md.metrics, from_fasta.metrics);
    assert_eq!(from_md.metrics.regions_without_reference, 0);
}

#[test]
fn test_known_site_candidate_realigns_like_observed_indel() {
    let anchor = INSERTION_POS - 1;
    let site = KnownSiteRecord {
        contig: "chr1".to_string(),
        position: anchor + 1,
        reference: CHR1[anchor..=anchor].to_string(),
        alt: format!("{}TGA", &CHR1[anchor..=anchor]),
    };
    let generator = ConsensusGenerator::FromKnownSites(Arc::new(KnownSites::from_records([site])));
    let specs = insertion_scenario();
    let output = IndelRealigner::new(RealignmentConfig::default(), generator)
        .unwrap()
        .realign(reads_of(&specs), Some(&MapReference::chr1()))
        .unwrap();

    let moved = &output.reads[index_of(&specs, "mis")];
    assert_eq!(moved.start(), Some(35));
    assert_eq!(cigar_to_string(moved.cigar()), "15M3I22M");
    assert_eq!(output.metrics.reads_realigned, 1);
}

/// Fifty reads, each with its own 1-base deletion, all in one region. Only the thirty
/// candidates that rank first are kept, and every read (all already correctly aligned) is
/// returned unchanged.
#[test]
fn test_candidate_cap_keeps_top_ranked_singletons() {
    // No two adjacent bases are equal, so no deletion can be shifted left.
    const REFERENCE: &str = "CGTATGCTCTACAGAGTCGACTCGTGTGTCGAGCGACGATAGATCAGTATGCAGACTGCAGCTAGTCGTGATGATCAGTGTAGTGCGCGTACGCGCGCTAGCTCAGCTGCACGCGAGCTGTGTGTATCATCATGCAGACACTATACGCATAGCGTAGCACGCATAGCGTATGACATATGCGAGTGCGTACATACAGTATA";
    let reads: Vec<AlignedRead> = (0..50)
        .map(|i| {
            let start = 2 * i;
            let bases =
                format!("{}{}", &REFERENCE[start..start + 20], &REFERENCE[start + 21..start + 61]);
            AlignedRead::mapped(
                format!("del{i}"),
                "chr1",
                start,
                parse_cigar("20M1D40M").unwrap(),
                bases,
                vec![30; 60],
            )
        })
        .collect();
    let reference = MapReference(
        [("chr1".to_string(), REFERENCE.as_bytes().to_vec())].into_iter().collect(),
    );
    let config = RealignmentConfig { max_consensus_number: 30, ..Default::default() };

    let generator = ConsensusGenerator::FromReads;
    let members: Vec<IndexedRead> =
        reads.iter().cloned().enumerate().map(|(i, r)| IndexedRead::new(i, r)).collect();
    let region = ReferenceRegion::new("chr1", 0, 159);
    let window = &REFERENCE.as_bytes()[0..159];
    let candidates = generator.generate(&region, &members, Some(window), &config);
    assert_eq!(candidates.len(), 30);
    let starts: Vec<usize> = candidates.iter().map(|c| c.ref_start()).collect();
    assert_eq!(starts, (0..30).map(|i| 20 + 2 * i).collect::<Vec<_>>());

    let output = IndelRealigner::new(config, generator)
        .unwrap()
        .realign(reads.clone(), Some(&reference))
        .unwrap();
    assert_eq!(output.reads, reads);
    assert_eq!(output.regions.len(), 1);
    assert_eq!(output.regions[0].candidates, 30);
    assert_eq!(output.metrics.reads_realigned, 0);
}

/// A misaligned read starting upstream of every gapped read is still scored once the gapped
/// reads open a region over it.
#[test]
fn test_misaligned_read_upstream_of_first_indel_read_is_realigned() {
    let hap = haplotype();
    let specs = vec![
        ReadSpec::new("mis", 32, "30M", &hap[32..62], 30),
        ReadSpec::new("ins1", 35, "15M3I15M", &hap[35..68], 30),
        ReadSpec::new("ins2", 40, "10M3I20M", &hap[40..73], 30),
    ];
    let input = reads_of(&specs);
    let output = realign(input.clone(), RealignmentConfig::default());

    let moved = &output.reads[0];
    assert_eq!(moved.start(), Some(32));
    assert_eq!(cigar_to_string(moved.cigar()), "18M3I9M");
    assert_eq!(moved.md(), Some("27"));
    assert_eq!(moved.edit_distance(), Some(3));
    assert_eq!(output.reads[1], input[1]);
    assert_eq!(output.reads[2], input[2]);

    assert_eq!(output.metrics.reads_in_regions, 3);
    assert_eq!(output.metrics.reads_realigned, 1);
    let region = &output.regions[0];
    assert_eq!((region.start, region.end), (32, 70));
    assert_eq!((region.reads, region.indel_reads), (3, 2));
}

/// A read far from everything else never enters a region.
#[test]
fn test_isolated_read_is_untouched() {
    let mut input = reads_of(&insertion_scenario());
    let far = AlignedRead::mapped(
        "far",
        "chr1",
        10_085,
        parse_cigar("40M").unwrap(),
        "ACGTTGCAACGTTGCAACGTTGCAACGTTGCAACGTTGCA",
        vec![30; 40],
    );
    input.push(far.clone());

    let output = realign(input, RealignmentConfig::default());
    assert_eq!(output.reads.last(), Some(&far));
    assert_eq!(output.metrics.total_reads, 13);
    assert_eq!(output.metrics.reads_in_regions, 12);
    assert_eq!(output.regions.len(), 1);
}

/// With a zero threshold any strict improvement is accepted, however small.
#[test]
fn test_zero_threshold_accepts_marginal_improvement() {
    let hap = haplotype();
    let specs = vec![
        ReadSpec::new("ins", 30, "20M3I17M", &hap[30..70], 30),
        ReadSpec::new("marginal", 30, "25M", &hap[30..55], 10),
        ReadSpec::new("ref", 40, "30M", &CHR1[40..70], 30),
    ];
    let input = reads_of(&specs);

    let strict = realign(input.clone(), RealignmentConfig::default());
    assert_eq!(strict.reads, input);
    assert!((strict.regions[0].max_log_odds).abs() < 1e-9);

    let config = RealignmentConfig { lod_threshold: 0.0, ..Default::default() };
    let lenient = realign(input.clone(), config);
    let marginal = &lenient.reads[1];
    assert_eq!(marginal.start(), Some(30));
    assert_eq!(cigar_to_string(marginal.cigar()), "20M3I2M");
    assert_eq!(marginal.md(), Some("22"));
    assert_eq!(marginal.edit_distance(), Some(3));
    assert!((lenient.regions[0].max_log_odds - 4.0).abs() < 1e-9);
    assert_eq!(lenient.reads[0], input[0]);
    assert_eq!(lenient.reads[2], input[2]);
}

#[test]
fn test_unmapped_and_malformed_reads_pass_through() {
    let mut input = reads_of(&insertion_scenario());
    let unmapped = AlignedRead::unmapped("u", "ACGTACGT", vec![30; 8]);
    let malformed = AlignedRead::mapped(
        "bad",
        "chr1",
        40,
        parse_cigar("10M").unwrap(),
        "ACGTACGTACGT",
        vec![30; 12],
    );
    input.insert(0, unmapped.clone());
    input.insert(5, malformed.clone());

    let output = realign(input, RealignmentConfig::default());
    assert_eq!(output.reads.len(), 14);
    assert_eq!(output.reads[0], unmapped);
    assert_eq!(output.reads[5], malformed);
    assert_eq!(output.metrics.unmapped_reads, 1);
    assert_eq!(output.metrics.reads_malformed, 1);
    assert_eq!(output.metrics.reads_realigned, 1);
}

#[test]
fn test_declared_sorted_input_out_of_order_fails() {
    let mut input = reads_of(&insertion_scenario());
    input.swap(0, 11);
    let config = RealignmentConfig { is_sorted: true, ..Default::default() };
    let result = IndelRealigner::new(config, ConsensusGenerator::FromReads)
        .unwrap()
        .realign(input, Some(&MapReference::chr1()));
    assert!(matches!(result, Err(RealignError::InputNotSorted { .. })));
}

#[test]
fn test_unsorted_input_is_returned_in_input_order() {
    let mut input = reads_of(&insertion_scenario());
    input.reverse();
    let output = realign(input.clone(), RealignmentConfig::default());

    let names: Vec<_> = output.reads.iter().map(|r| r.name().to_string()).collect();
    let expected: Vec<_> = input.iter().map(|r| r.name().to_string()).collect();
    assert_eq!(names, expected);
    assert_eq!(output.metrics.reads_realigned, 1);
}
