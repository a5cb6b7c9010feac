//! CLI command implementations for fgrealign.
//!
//! - [`realign`] - Realign reads around indels and write a new BAM
//! - [`targets`] - List the target regions without realigning

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::too_many_lines
)]

pub mod command;
pub mod common;
pub mod realign;
pub mod targets;
