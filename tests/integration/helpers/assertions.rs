//! Assertion helpers for BAM records.

#![allow(dead_code)]

use fgrealign_lib::model::cigar::cigar_to_string;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;

fn tag(name: &str) -> Tag {
    let [a, b] = name.as_bytes() else { panic!("tag names have two characters: {name}") };
    Tag::new(*a, *b)
}

/// Value of a string tag.
pub fn string_tag(record: &RecordBuf, name: &str) -> Option<String> {
    match record.data().get(&tag(name)) {
        Some(Value::String(s)) => Some(s.to_string()),
        _ => None,
    }
}

/// Value of an integer tag.
pub fn int_tag(record: &RecordBuf, name: &str) -> Option<i64> {
    record.data().get(&tag(name)).and_then(Value::as_int)
}

/// CIGAR of a record as a string.
pub fn cigar_of(record: &RecordBuf) -> String {
    cigar_to_string(record.cigar().as_ref())
}

/// Name of a record.
pub fn name_of(record: &RecordBuf) -> String {
    record.name().map(ToString::to_string).unwrap_or_default()
}

/// 1-based alignment start of a record.
pub fn start_of(record: &RecordBuf) -> Option<usize> {
    record.alignment_start().map(usize::from)
}

/// Asserts that a record was written back without any change to its alignment or tags.
///
/// # Panics
///
/// Panics if the position, CIGAR, sequence, qualities or tags differ.
pub fn assert_record_unchanged(before: &RecordBuf, after: &RecordBuf) {
    let name = name_of(before);
    assert_eq!(name_of(after), name);
    assert_eq!(start_of(after), start_of(before), "start changed for {name}");
    assert_eq!(cigar_of(after), cigar_of(before), "CIGAR changed for {name}");
    assert_eq!(after.sequence(), before.sequence(), "bases changed for {name}");
    assert_eq!(after.quality_scores(), before.quality_scores(), "qualities changed for {name}");
    assert_eq!(string_tag(after, "OC"), None, "{name} has an OC tag");
    assert_eq!(int_tag(after, "OP"), None, "{name} has an OP tag");
    assert_eq!(string_tag(after, "MD"), string_tag(before, "MD"), "MD changed for {name}");
    assert_eq!(string_tag(after, "RG"), string_tag(before, "RG"), "RG changed for {name}");
}
