//! Turns a parsed command tree into running processes.

mod io;
mod run;

pub use run::{ExitOutcome, ShellExecutor};
