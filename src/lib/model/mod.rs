//! Data model shared by the realignment engine and the BAM front end.

pub mod cigar;
pub mod read;
pub mod region;

pub use read::{AlignedRead, IndelEvent, IndexedRead, MalformedAlignment};
pub use region::ReferenceRegion;
