//! Error taxonomy shared by the parser and the executor.
//!
//! Every error in this crate resolves to one of a fixed set of process exit
//! codes. Parse errors are always reported with an `Error while parsing:`
//! prefix and a source excerpt; the handful of fatal runtime errors
//! (`Syscall`, `Internal`) are printed bare, matching the convention that
//! only parse-time diagnostics get positional context.

use thiserror::Error;

use crate::span::context_snippet;

/// Number of characters of source shown on either side of an error position.
const SNIPPET_CONTEXT: usize = 24;

/// Stable exit codes. A parse failure or a fatal executor error both resolve
/// to one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BracketsBalance = 0x01,
    NoOperand = 0x02,
    NoOperation = 0x03,
    InvalidOperation = 0x04,
    InvalidOperand = 0x05,
    InternalError = 0x07,
    MemoryError = 0x08,
    SyscallError = 0x09,
}

impl ErrorCode {
    pub fn exit_code(self) -> i32 {
        self as i32
    }
}

/// A process exited normally with code 0-125.
pub const EXIT_MAX_NORMAL: i32 = 125;
/// An empty input line, or any other startup failure that never reaches the
/// parser at all. Numerically the same as [`ErrorCode::BracketsBalance`],
/// matching the historical `ERROR_EXIT`/`BRACKETS_BALANCE` alias.
pub const ERROR_EXIT: i32 = 0x01;
/// `execvp`-equivalent failure: the program could not be started at all.
pub const EXEC_ERROR: i32 = 0x7F;
/// Added to a signal number to report a child killed by that signal.
pub const SIGNAL_OFFSET: i32 = 128;

/// An error raised while turning input text into a command tree.
///
/// Carries the byte offset in the original input where parsing could not
/// continue, so [`ParseError::diagnostic`] can render a caret under the
/// offending character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the balance of brackets is broken")]
    BracketsBalance { pos: usize },
    #[error("no operand spotted")]
    NoOperand { pos: usize },
    #[error("no operation between operands")]
    NoOperation { pos: usize },
    #[error("invalid operation '{found}'")]
    InvalidOperation { pos: usize, found: char },
}

impl ParseError {
    pub fn pos(&self) -> usize {
        match *self {
            ParseError::BracketsBalance { pos }
            | ParseError::NoOperand { pos }
            | ParseError::NoOperation { pos }
            | ParseError::InvalidOperation { pos, .. } => pos,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::BracketsBalance { .. } => ErrorCode::BracketsBalance,
            ParseError::NoOperand { .. } => ErrorCode::NoOperand,
            ParseError::NoOperation { .. } => ErrorCode::NoOperation,
            ParseError::InvalidOperation { .. } => ErrorCode::InvalidOperation,
        }
    }

    /// Render `Error while parsing: <message> at: <excerpt>`, matching the
    /// historical wording of this family of diagnostics.
    pub fn diagnostic(&self, input: &str) -> String {
        let excerpt = context_snippet(input, self.pos(), SNIPPET_CONTEXT);
        format!("Error while parsing: {self} at: {excerpt}")
    }
}

/// A fatal error raised while evaluating a parsed command tree.
///
/// Unlike [`ParseError`], these are never recoverable - a pipe that can't be
/// created or a wait() that fails means the shell itself is in trouble, not
/// the command it was running.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Internal(&'static str),
}

impl ExecError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecError::Io(_) => ErrorCode::SyscallError,
            ExecError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_documented_values() {
        assert_eq!(ErrorCode::BracketsBalance.exit_code(), 0x01);
        assert_eq!(ErrorCode::NoOperand.exit_code(), 0x02);
        assert_eq!(ErrorCode::NoOperation.exit_code(), 0x03);
        assert_eq!(ErrorCode::InvalidOperation.exit_code(), 0x04);
        assert_eq!(ErrorCode::InvalidOperand.exit_code(), 0x05);
        assert_eq!(ErrorCode::InternalError.exit_code(), 0x07);
        assert_eq!(ErrorCode::MemoryError.exit_code(), 0x08);
        assert_eq!(ErrorCode::SyscallError.exit_code(), 0x09);
        assert_eq!(ERROR_EXIT, ErrorCode::BracketsBalance.exit_code());
    }

    #[test]
    fn diagnostic_includes_prefix_and_excerpt() {
        let input = "echo hi)";
        let err = ParseError::BracketsBalance { pos: 7 };
        let msg = err.diagnostic(input);
        assert!(msg.starts_with("Error while parsing: "));
        assert!(msg.contains("the balance of brackets is broken"));
        assert!(msg.contains(')'));
    }

    #[test]
    fn io_error_maps_to_syscall_code() {
        let io_err = std::io::Error::other("boom");
        let err: ExecError = io_err.into();
        assert_eq!(err.code(), ErrorCode::SyscallError);
    }

    #[test]
    fn internal_error_maps_to_internal_code() {
        let err = ExecError::Internal("worker panicked");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
