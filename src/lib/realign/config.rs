//! Engine configuration.

use crate::errors::{RealignError, Result};

/// Default maximum length of an insertion or deletion used as evidence or candidate.
pub const DEFAULT_MAX_INDEL_SIZE: usize = 500;
/// Default cap on candidate consensuses per target region.
pub const DEFAULT_MAX_CONSENSUS_NUMBER: usize = 30;
/// Default log-odds threshold (log10 units) a realignment must exceed.
pub const DEFAULT_LOD_THRESHOLD: f64 = 5.0;
/// Default maximum width of a target region in reference bases.
pub const DEFAULT_MAX_TARGET_SIZE: usize = 3000;

/// Tunables for [`IndelRealigner`](super::IndelRealigner).
#[derive(Debug, Clone, PartialEq)]
pub struct RealignmentConfig {
    /// Whether the input is already ordered by reference and start
    pub is_sorted: bool,
    /// Longest insertion or deletion considered
    pub max_indel_size: usize,
    /// Maximum number of candidate consensuses kept per region
    pub max_consensus_number: usize,
    /// Minimum log-odds improvement required to move a read
    pub lod_threshold: f64,
    /// Maximum width of a target region
    pub max_target_size: usize,
}

impl Default for RealignmentConfig {
    fn default() -> Self {
        Self {
            is_sorted: false,
            max_indel_size: DEFAULT_MAX_INDEL_SIZE,
            max_consensus_number: DEFAULT_MAX_CONSENSUS_NUMBER,
            lod_threshold: DEFAULT_LOD_THRESHOLD,
            max_target_size: DEFAULT_MAX_TARGET_SIZE,
        }
    }
}

impl RealignmentConfig {
    /// Checks every value before any processing starts.
    ///
    /// # Errors
    /// Returns [`RealignError::InvalidParameter`] for a zero size or count, or a negative or
    /// non-finite threshold.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max-indel-size", self.max_indel_size),
            ("max-consensus-number", self.max_consensus_number),
            ("max-target-size", self.max_target_size),
        ];
        for (parameter, value) in positive {
            if value == 0 {
                return Err(RealignError::InvalidParameter {
                    parameter: parameter.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }

        if !self.lod_threshold.is_finite() || self.lod_threshold < 0.0 {
            return Err(RealignError::InvalidParameter {
                parameter: "lod-threshold".to_string(),
                reason: format!("must be a finite value >= 0, got {}", self.lod_threshold),
            });
        }

        Ok(())
    }
}
