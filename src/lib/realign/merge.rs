//! Recombines region output and unaffected reads into input order.

use crate::errors::{RealignError, Result};
use crate::model::{AlignedRead, IndexedRead};

/// Places every read at its input index.
///
/// # Errors
/// Returns [`RealignError::CardinalityMismatch`] if an index is out of range, seen twice, or
/// missing.
pub fn merge(
    expected: usize,
    reads: impl IntoIterator<Item = IndexedRead>,
) -> Result<Vec<AlignedRead>> {
    let mut slots: Vec<Option<AlignedRead>> = vec![None; expected];
    let mut seen = 0usize;

    for IndexedRead { index, read } in reads {
        seen += 1;
        let Some(slot) = slots.get_mut(index) else {
            return Err(RealignError::CardinalityMismatch {
                expected,
                actual: seen,
                reason: format!("index {index} is out of range"),
            });
        };
        if slot.is_some() {
            return Err(RealignError::CardinalityMismatch {
                expected,
                actual: seen,
                reason: format!("index {index} appears more than once"),
            });
        }
        *slot = Some(read);
    }

    let mut merged = Vec::with_capacity(expected);
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(read) => merged.push(read),
            None => {
                return Err(RealignError::CardinalityMismatch {
                    expected,
                    actual: seen,
                    reason: format!("index {index} is missing"),
                });
            }
        }
    }
    Ok(merged)
}
