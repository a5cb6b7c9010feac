//! Properties that hold for any input: cardinality, identity, pass-through, the improvement
//! guarantee, region and candidate bounds, and determinism across thread counts.

use std::collections::HashMap;

use fgrealign_lib::model::AlignedRead;
use fgrealign_lib::model::cigar::parse_cigar;
use fgrealign_lib::realign::scorer::original_cost;
use fgrealign_lib::realign::{ConsensusGenerator, IndelRealigner, RealignmentConfig};
use proptest::prelude::*;

use crate::helpers::MapReference;

const REFERENCE_LENGTH: usize = 300;

/// Deterministic pseudo-random reference.
fn reference_bases() -> Vec<u8> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..REFERENCE_LENGTH)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"ACGT"[(state % 4) as usize]
        })
        .collect()
}

/// How a generated read relates to the reference.
#[derive(Debug, Clone)]
enum Shape {
    /// Plain reference read
    Reference,
    /// Deletion of `len` bases, aligned with the gap
    Deletion { len: usize },
    /// Insertion of `bases`, aligned with the gap
    Insertion { bases: Vec<u8> },
    /// Insertion of `bases`, aligned without a gap
    Misaligned { bases: Vec<u8> },
}

#[derive(Debug, Clone)]
struct ReadPlan {
    start: usize,
    before: usize,
    after: usize,
    shape: Shape,
}

impl ReadPlan {
    fn build(&self, index: usize, reference: &[u8]) -> AlignedRead {
        let (start, before, after) = (self.start, self.before, self.after);
        let (bases, cigar) = match &self.shape {
            Shape::Reference => {
                (reference[start..start + before + after].to_vec(), format!("{}M", before + after))
            }
            Shape::Deletion { len } => {
                let gap = start + before;
                let bases = [&reference[start..gap], &reference[gap + len..gap + len + after]].concat();
                (bases, format!("{before}M{len}D{after}M"))
            }
            Shape::Insertion { bases } => {
                let gap = start + before;
                let read = [&reference[start..gap], bases.as_slice(), &reference[gap..gap + after]]
                    .concat();
                (read, format!("{before}M{}I{after}M", bases.len()))
            }
            Shape::Misaligned { bases } => {
                let gap = start + before;
                let read = [&reference[start..gap], bases.as_slice(), &reference[gap..gap + after]]
                    .concat();
                let len = read.len();
                (read, format!("{len}M"))
            }
        };
        let qualities = vec![30; bases.len()];
        AlignedRead::mapped(
            format!("r{index}"),
            "chr1",
            start,
            parse_cigar(&cigar).unwrap(),
            bases,
            qualities,
        )
    }
}

fn inserted_bases() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 1..=4)
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        3 => Just(Shape::Reference),
        2 => (1usize..=4).prop_map(|len| Shape::Deletion { len }),
        2 => inserted_bases().prop_map(|bases| Shape::Insertion { bases }),
        2 => inserted_bases().prop_map(|bases| Shape::Misaligned { bases }),
    ]
}

fn read_plan() -> impl Strategy<Value = ReadPlan> {
    (0usize..200, 5usize..=30, 5usize..=30, shape())
        .prop_map(|(start, before, after, shape)| ReadPlan { start, before, after, shape })
}

fn config() -> RealignmentConfig {
    RealignmentConfig {
        max_consensus_number: 3,
        max_target_size: 80,
        lod_threshold: 2.0,
        ..Default::default()
    }
}

fn realigner() -> IndelRealigner {
    IndelRealigner::new(config(), ConsensusGenerator::FromReads).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_read_is_returned_once_in_order(plans in prop::collection::vec(read_plan(), 1..40)) {
        let bases = reference_bases();
        let reference = MapReference(HashMap::from([("chr1".to_string(), bases.clone())]));
        let input: Vec<AlignedRead> =
            plans.iter().enumerate().map(|(i, p)| p.build(i, &bases)).collect();

        let output = realigner().realign(input.clone(), Some(&reference)).unwrap();
        prop_assert_eq!(output.reads.len(), input.len());
        prop_assert_eq!(output.metrics.total_reads, input.len() as u64);

        for (before, after) in input.iter().zip(&output.reads) {
            prop_assert_eq!(after.name(), before.name());
            prop_assert_eq!(after.sequence(), before.sequence());
            prop_assert_eq!(after.qualities(), before.qualities());
            match after.original_alignment() {
                None => prop_assert_eq!(after, before),
                Some((start, cigar)) => {
                    prop_assert_eq!(Some(start), before.start());
                    prop_assert_eq!(cigar, before.cigar());
                }
            }
        }
    }

    #[test]
    fn prop_realigned_reads_improve_by_more_than_threshold(
        plans in prop::collection::vec(read_plan(), 1..40)
    ) {
        let bases = reference_bases();
        let reference = MapReference(HashMap::from([("chr1".to_string(), bases.clone())]));
        let input: Vec<AlignedRead> =
            plans.iter().enumerate().map(|(i, p)| p.build(i, &bases)).collect();

        let output = realigner().realign(input.clone(), Some(&reference)).unwrap();
        for (before, after) in input.iter().zip(&output.reads) {
            if after.original_alignment().is_some() {
                let old_cost = original_cost(before, &bases, 0);
                let new_cost = original_cost(after, &bases, 0);
                prop_assert!(old_cost - new_cost > config().lod_threshold);
            }
        }
        for region in &output.regions {
            prop_assert!(region.end - region.start <= config().max_target_size);
            prop_assert!(region.candidates <= config().max_consensus_number);
        }
    }

    #[test]
    fn prop_output_does_not_depend_on_thread_count(
        plans in prop::collection::vec(read_plan(), 1..40)
    ) {
        let bases = reference_bases();
        let reference = MapReference(HashMap::from([("chr1".to_string(), bases.clone())]));
        let input: Vec<AlignedRead> =
            plans.iter().enumerate().map(|(i, p)| p.build(i, &bases)).collect();
        let engine = realigner();

        let run = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            pool.install(|| engine.realign(input.clone(), Some(&reference))).unwrap()
        };
        let single = run(1);
        let multi = run(4);
        let again = run(4);

        prop_assert_eq!(&single.reads, &multi.reads);
        prop_assert_eq!(&multi.reads, &again.reads);
        prop_assert_eq!(&single.metrics, &multi.metrics);
        prop_assert_eq!(&single.regions, &multi.regions);
    }
}
