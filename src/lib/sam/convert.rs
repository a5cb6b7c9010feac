//! Conversion between noodles [`RecordBuf`] and [`AlignedRead`].
//!
//! Records are converted into engine reads on the way in; on the way out only reads that the
//! engine moved are written back onto their original records, so every other field and tag of
//! a record survives untouched.

use anyhow::{Result, anyhow};
use noodles::core::Position;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;

use crate::model::AlignedRead;
use crate::model::cigar::cigar_to_string;

/// NM: edit distance to the reference.
pub const EDIT_DISTANCE_TAG: Tag = Tag::new(b'N', b'M');
/// MD: mismatching positions.
pub const MD_TAG: Tag = Tag::new(b'M', b'D');
/// OC: CIGAR before realignment.
pub const ORIGINAL_CIGAR_TAG: Tag = Tag::new(b'O', b'C');
/// OP: 1-based position before realignment.
pub const ORIGINAL_POSITION_TAG: Tag = Tag::new(b'O', b'P');

/// Builds an [`AlignedRead`] from a record.
///
/// `reference_names` maps reference sequence IDs to names (see
/// [`reference_names`](crate::header::reference_names)). An ID outside the dictionary leaves the
/// read without a reference name, which the engine treats as a malformed alignment.
#[must_use]
pub fn record_to_read(record: &RecordBuf, reference_names: &[String]) -> AlignedRead {
    let name = record.name().map(|n| n.to_vec()).unwrap_or_else(|| b"*".to_vec());
    let reference_name =
        record.reference_sequence_id().and_then(|id| reference_names.get(id)).cloned();
    let start = record.alignment_start().map(|pos| usize::from(pos) - 1);

    let md = match record.data().get(&MD_TAG) {
        Some(Value::String(s)) => Some(s.to_string()),
        _ => None,
    };
    let edit_distance = record
        .data()
        .get(&EDIT_DISTANCE_TAG)
        .and_then(Value::as_int)
        .and_then(|nm| u32::try_from(nm).ok());

    AlignedRead::mapped(
        name,
        String::new(),
        0,
        record.cigar().as_ref().to_vec(),
        record.sequence().as_ref().to_vec(),
        record.quality_scores().as_ref().to_vec(),
    )
    .with_placement(reference_name, start)
    .with_flags(record.flags())
    .with_mapping_quality(record.mapping_quality().map(u8::from))
    .with_md(md)
    .with_edit_distance(edit_distance)
}

/// Writes a realigned read's alignment back onto its record.
///
/// Sets the position, CIGAR, MD and NM, and records the prior alignment in OC and OP unless the
/// record already carries them from an earlier realignment. Reads without an original alignment
/// were not moved and leave the record unchanged. Returns whether the record changed.
///
/// # Errors
/// Returns an error if the read has no start position.
pub fn apply_realignment(record: &mut RecordBuf, read: &AlignedRead) -> Result<bool> {
    let Some((original_start, original_cigar)) = read.original_alignment() else {
        return Ok(false);
    };
    let start = read
        .start()
        .ok_or_else(|| anyhow!("realigned read '{}' has no start position", read.name()))?;

    *record.alignment_start_mut() = Some(Position::try_from(start + 1)?);
    *record.cigar_mut() = read.cigar().iter().copied().collect();

    let data = record.data_mut();
    if let Some(md) = read.md() {
        data.insert(MD_TAG, Value::from(md));
    }
    if let Some(nm) = read.edit_distance() {
        data.insert(EDIT_DISTANCE_TAG, Value::from(nm));
    }
    if data.get(&ORIGINAL_CIGAR_TAG).is_none() && data.get(&ORIGINAL_POSITION_TAG).is_none() {
        data.insert(ORIGINAL_CIGAR_TAG, Value::from(cigar_to_string(original_cigar)));
        data.insert(ORIGINAL_POSITION_TAG, Value::from(u32::try_from(original_start + 1)?));
    }
    Ok(true)
}

/// `name:position` (1-based) of a record, for progress and error messages.
#[must_use]
pub fn locate(record: &RecordBuf, reference_names: &[String]) -> String {
    let name = record
        .reference_sequence_id()
        .and_then(|id| reference_names.get(id))
        .map_or("*", String::as_str);
    match record.alignment_start() {
        Some(pos) => format!("{name}:{pos}"),
        None => format!("{name}:*"),
    }
}
