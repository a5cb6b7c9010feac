//! SAM/BAM record plumbing around the realignment engine.
//!
//! - [`convert`] moves noodles records in and out of [`AlignedRead`](crate::model::AlignedRead)
//! - [`builder`] builds records, headers and FASTA files for tests

pub mod builder;
pub mod convert;

pub use convert::{apply_realignment, locate, record_to_read};
