//! The `shell_commands` binary: acquire one line of input, parse it, run it.
//!
//! Everything interesting lives in the library (`parser`, `exec`); this file
//! is only the external collaborator the core spec calls out as out of
//! scope - reading a line from somewhere, and turning the library's own
//! error types into process exit codes.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use argh::FromArgs;
use shell_commands::env::Environment;
use shell_commands::error::ERROR_EXIT;
use shell_commands::exec::ShellExecutor;
use shell_commands::parser;

/// A miniature command-line shell: parses one line and runs it.
#[derive(FromArgs)]
struct Args {
    /// run COMMAND instead of reading a line from stdin, like `sh -c`.
    #[argh(option, short = 'c')]
    command: Option<String>,
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Args = argh::from_env();
    let line = match args.command {
        Some(command) => command,
        None => match read_one_line()? {
            Some(line) => line,
            None => {
                eprintln!("Empty statement!");
                std::process::exit(ERROR_EXIT);
            }
        },
    };

    tracing::debug!(%line, "parsing input");

    let tree = match parser::parse(&line) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{}", err.diagnostic(&line));
            std::process::exit(err.code().exit_code());
        }
    };

    let executor = ShellExecutor::new(Environment::new());
    let outcome = executor
        .execute(tree.as_ref())
        .context("fatal error while executing the parsed command")?;
    std::process::exit(outcome.exit_code());
}

/// Read one logical line from stdin: everything up to the first `\n`, or
/// up to EOF if no newline appears. `Ok(None)` means the line had no
/// content at all (immediate EOF, or a blank line) - the caller reports
/// that as "Empty statement!" rather than handing an empty string to the
/// parser, matching the original `main`'s up-front check.
fn read_one_line() -> Result<Option<String>> {
    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading a line from stdin")?;
    if n == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches('\n');
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}
