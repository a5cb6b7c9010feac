//! The [`Command`] trait implemented by every fgrealign subcommand.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// A runnable subcommand.
///
/// `command_line` is the full invocation, recorded in the output @PG header record.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
