//! Custom error types for fgrealign operations.

use thiserror::Error;

/// Result type alias for fgrealign operations
pub type Result<T> = std::result::Result<T, RealignError>;

/// Error type for fgrealign operations
#[derive(Error, Debug)]
pub enum RealignError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "known sites")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Required reference sequence not found
    #[error("Reference sequence '{ref_name}' not found")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
    },

    /// Input declared as coordinate sorted is out of order
    #[error(
        "Input is not coordinate sorted: read '{read_name}' at {ref_name}:{position} follows {previous}"
    )]
    InputNotSorted {
        /// Name of the out-of-order read
        read_name: String,
        /// Reference of the out-of-order read
        ref_name: String,
        /// 0-based start of the out-of-order read
        position: usize,
        /// Description of the preceding position
        previous: String,
    },

    /// Output does not contain exactly one record per input record
    #[error("Realignment produced {actual} records for {expected} input records ({reason})")]
    CardinalityMismatch {
        /// Number of input reads
        expected: usize,
        /// Number of output reads
        actual: usize,
        /// Which index was lost or duplicated
        reason: String,
    },

    /// MD tag could not be parsed or does not agree with the CIGAR
    #[error("Invalid MD tag '{md}': {reason}")]
    InvalidMdTag {
        /// The offending MD string
        md: String,
        /// Explanation of the problem
        reason: String,
    },
}
