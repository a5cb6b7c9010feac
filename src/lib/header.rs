//! SAM header helpers: @PG chaining and reference dictionary lookups.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::program::tag;
use std::collections::HashSet;

/// Program ID and name written to @PG records.
pub const PROGRAM_ID: &str = "fgrealign";

/// Returns the ID of the program at the end of the @PG chain.
///
/// That is the program no other program names as its PP. Returns `None` when the header has no
/// programs.
#[must_use]
pub fn last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let program_map = programs.as_ref();

    let referenced: HashSet<&[u8]> = program_map
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_slice())
        .collect();

    program_map
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| program_map.keys().next())
        .map(|id| String::from_utf8_lossy(id).into_owned())
}

/// Returns `base_id`, or `base_id.N` for the smallest `N` not already used in the header.
#[must_use]
pub fn unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let program_map = programs.as_ref();

    if !program_map.contains_key(base_id.as_bytes()) {
        return base_id.to_string();
    }
    (1usize..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !program_map.contains_key(candidate.as_bytes()))
        .unwrap_or_else(|| base_id.to_string())
}

/// Appends an `fgrealign` @PG record chained (PP) to the last existing program.
///
/// # Errors
/// Returns an error if the program record cannot be built or added.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let previous = last_program_id(&header);
    let id = unique_program_id(&header, PROGRAM_ID);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_ID)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous.as_deref() {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }

    header.programs_mut().add(BString::from(id), builder.build()?)?;
    Ok(header)
}

/// Reference sequence names in header order, indexed by reference sequence ID.
#[must_use]
pub fn reference_names(header: &Header) -> Vec<String> {
    header
        .reference_sequences()
        .keys()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}
