//! Integration tests for fgrealign.
//!
//! Engine scenarios and properties run against the library; command tests run the `fgrealign`
//! binary on BAM files built in temporary directories.

mod helpers;
mod test_error_paths;
mod test_realign_engine;
mod test_realign_properties;
mod test_targets_command;
