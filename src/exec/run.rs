//! Evaluates a parsed command tree against real OS processes.
//!
//! The original design this crate is descended from forks the interpreter
//! itself at every tree node, so concurrency (pipes, `&`) falls out of
//! `fork()` for free. Safe Rust has no `fork()`, so this executor
//! replaces "fork a branch" with two different primitives depending on
//! whether the branch actually needs to run concurrently with its
//! sibling:
//!
//! - [`BinaryOp::Pipe`] and [`BinaryOp::Parallel`] spawn a
//!   [`std::thread::scope`] worker per side. A thread is the direct
//!   analogue of a forked branch here: it may itself recurse arbitrarily
//!   deep (through groups and sequences) and spawn any number of real
//!   child processes, all while its sibling progresses concurrently.
//! - [`BinaryOp::Sequence`], [`BinaryOp::Conjunction`] and
//!   [`BinaryOp::Disjunction`] only ever need one side at a time, so
//!   they're ordinary recursive calls.
//!
//! Only [`Node::Command`] leaves ever spawn a real [`std::process::Child`];
//! every other node just computes the right `Stdio` overrides and recurses.

use std::process::{Command, ExitStatus};

use crate::ast::{BinaryOp, Node, RedirectionSet};
use crate::env::Environment;
use crate::error::{ExecError, EXEC_ERROR, SIGNAL_OFFSET};

use super::io::{resolve_stdin, resolve_stdout, IoHandle};

/// How a subtree finished: a normal exit code, or death by signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ExitOutcome {
    /// The value `start_execution` would report for the whole tree:
    /// the exit code unchanged, or `128 + signum` for a signal death.
    pub fn exit_code(self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(sig) => SIGNAL_OFFSET + sig,
        }
    }

    fn succeeded(self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }
}

fn translate(status: ExitStatus) -> ExitOutcome {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => ExitOutcome::Exited(code),
        None => match status.signal() {
            Some(sig) => ExitOutcome::Signaled(sig),
            None => ExitOutcome::Exited(EXEC_ERROR),
        },
    }
}

fn join(result: std::thread::Result<Result<ExitOutcome, ExecError>>) -> Result<ExitOutcome, ExecError> {
    result.unwrap_or_else(|_| Err(ExecError::Internal("worker thread panicked")))
}

/// Evaluates a [`Node`] tree, spawning real child processes at its leaves.
pub struct ShellExecutor {
    env: Environment,
}

impl ShellExecutor {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    /// Run a whole parsed line. `None` (an empty input) exits 0, matching
    /// evaluating a leaf-less tree.
    pub fn execute(&self, node: Option<&Node>) -> Result<ExitOutcome, ExecError> {
        self.run(node, &IoHandle::Inherit, &IoHandle::Inherit)
    }

    fn run(&self, node: Option<&Node>, stdin: &IoHandle, stdout: &IoHandle) -> Result<ExitOutcome, ExecError> {
        let Some(node) = node else {
            return Ok(ExitOutcome::Exited(0));
        };
        match node {
            Node::Command { argv, redirections } => self.run_command(argv, redirections, stdin, stdout),
            Node::Group { inner, redirections } => self.run_group(inner, redirections, stdin, stdout),
            Node::Binary { op, left, right } => self.run_binary(*op, left, right.as_deref(), stdin, stdout),
        }
    }

    fn run_command(
        &self,
        argv: &[String],
        redirections: &RedirectionSet,
        stdin: &IoHandle,
        stdout: &IoHandle,
    ) -> Result<ExitOutcome, ExecError> {
        let stdin_override = resolve_stdin(redirections, &self.env.current_dir)?;
        let stdout_override = resolve_stdout(redirections, &self.env.current_dir)?;
        let stdin_handle = stdin_override.as_ref().unwrap_or(stdin);
        let stdout_handle = stdout_override.as_ref().unwrap_or(stdout);

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .current_dir(&self.env.current_dir)
            .envs(self.env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(stdin_handle.to_stdio()?)
            .stdout(stdout_handle.to_stdio()?);

        tracing::debug!(program = %argv[0], args = ?&argv[1..], "spawning");

        match command.spawn() {
            Ok(mut child) => {
                let status = child.wait()?;
                let outcome = translate(status);
                tracing::debug!(program = %argv[0], ?outcome, "child exited");
                Ok(outcome)
            }
            Err(e) => {
                // Mirrors `execvp` failing and the shell reporting it itself:
                // the parent never forked, so there is no child status to
                // translate - the command simply couldn't be started.
                eprintln!("{}: {}", argv[0], e);
                Ok(ExitOutcome::Exited(EXEC_ERROR))
            }
        }
    }

    fn run_group(
        &self,
        inner: &Node,
        redirections: &RedirectionSet,
        stdin: &IoHandle,
        stdout: &IoHandle,
    ) -> Result<ExitOutcome, ExecError> {
        let stdin_override = resolve_stdin(redirections, &self.env.current_dir)?;
        let stdout_override = resolve_stdout(redirections, &self.env.current_dir)?;
        let stdin_handle = stdin_override.as_ref().unwrap_or(stdin);
        let stdout_handle = stdout_override.as_ref().unwrap_or(stdout);
        self.run(Some(inner), stdin_handle, stdout_handle)
    }

    fn run_binary(
        &self,
        op: BinaryOp,
        left: &Node,
        right: Option<&Node>,
        stdin: &IoHandle,
        stdout: &IoHandle,
    ) -> Result<ExitOutcome, ExecError> {
        match op {
            BinaryOp::Sequence => {
                self.run(Some(left), stdin, stdout)?;
                self.run(right, stdin, stdout)
            }
            BinaryOp::Conjunction | BinaryOp::Disjunction => {
                let left_result = self.run(Some(left), stdin, stdout)?;
                let want_right = if op == BinaryOp::Conjunction {
                    left_result.succeeded()
                } else {
                    !left_result.succeeded()
                };
                if !want_right {
                    return Ok(left_result);
                }
                match right {
                    Some(right) => self.run(Some(right), stdin, stdout),
                    None => Ok(left_result),
                }
            }
            BinaryOp::Pipe => {
                let right = right.expect("pipe always has a right operand");
                let (reader, writer) = os_pipe::pipe()?;
                let left_stdout = IoHandle::PipeWrite(writer);
                let right_stdin = IoHandle::PipeRead(reader);
                let (left_res, right_res) = std::thread::scope(|scope| {
                    let left_thread = scope.spawn(move || {
                        let left_stdout = left_stdout;
                        self.run(Some(left), stdin, &left_stdout)
                    });
                    let right_thread = scope.spawn(move || {
                        let right_stdin = right_stdin;
                        self.run(Some(right), &right_stdin, stdout)
                    });
                    (left_thread.join(), right_thread.join())
                });
                join(left_res)?;
                join(right_res)
            }
            BinaryOp::Parallel => {
                // A trailing `&` parses just like a trailing `;` (§3): `right`
                // may be `None`, and `self.run(None, ..)` already reports
                // that branch as a harmless exit 0.
                let (left_res, right_res) = std::thread::scope(|scope| {
                    let left_thread = scope.spawn(|| self.run(Some(left), stdin, stdout));
                    let right_thread = scope.spawn(|| self.run(right, stdin, stdout));
                    (left_thread.join(), right_thread.join())
                });
                join(left_res)?;
                join(right_res)?;
                Ok(ExitOutcome::Exited(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::io::Read;

    fn run(line: &str) -> ExitOutcome {
        let tree = parse(line).unwrap();
        ShellExecutor::new(Environment::new()).execute(tree.as_ref()).unwrap()
    }

    #[test]
    fn true_exits_zero() {
        assert_eq!(run("true"), ExitOutcome::Exited(0));
    }

    #[test]
    fn false_exits_one() {
        assert_eq!(run("false"), ExitOutcome::Exited(1));
    }

    #[test]
    fn conjunction_short_circuits_on_failure() {
        assert_eq!(run("false && true"), ExitOutcome::Exited(1));
    }

    #[test]
    fn disjunction_short_circuits_on_success() {
        assert_eq!(run("true || false"), ExitOutcome::Exited(0));
    }

    #[test]
    fn pipeline_status_is_the_right_sides() {
        assert_eq!(run("true | false"), ExitOutcome::Exited(1));
        assert_eq!(run("false | true"), ExitOutcome::Exited(0));
    }

    #[test]
    fn parallel_always_exits_zero() {
        assert_eq!(run("false & false"), ExitOutcome::Exited(0));
    }

    #[test]
    fn trailing_parallel_with_no_right_operand_does_not_panic() {
        assert_eq!(run("true &"), ExitOutcome::Exited(0));
        assert_eq!(run("false &"), ExitOutcome::Exited(0));
    }

    #[test]
    fn missing_program_reports_exec_error() {
        assert_eq!(
            run("definitely-not-a-real-program-xyz"),
            ExitOutcome::Exited(EXEC_ERROR)
        );
    }

    #[test]
    fn empty_tree_exits_zero() {
        let env = Environment::new();
        let outcome = ShellExecutor::new(env).execute(None).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(0));
    }

    #[test]
    fn redirection_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.txt");
        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        let tree = parse(&format!("echo hello > {}", out_path.display())).unwrap();
        let outcome = ShellExecutor::new(env).execute(tree.as_ref()).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(0));

        let mut contents = String::new();
        std::fs::File::open(&out_path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello\n");
    }

    #[test]
    fn redirection_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.txt");
        std::fs::write(&in_path, "from a file\n").unwrap();
        let out_path = dir.path().join("out.txt");
        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        let tree = parse(&format!(
            "cat < {} > {}",
            in_path.display(),
            out_path.display()
        ))
        .unwrap();
        let outcome = ShellExecutor::new(env).execute(tree.as_ref()).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(0));

        let mut contents = String::new();
        std::fs::File::open(&out_path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "from a file\n");
    }

    #[test]
    fn append_redirection_does_not_truncate_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("log.txt");
        std::fs::write(&out_path, "first\n").unwrap();
        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        let tree = parse(&format!("echo second >> {}", out_path.display())).unwrap();
        let outcome = ShellExecutor::new(env).execute(tree.as_ref()).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(0));

        let mut contents = String::new();
        std::fs::File::open(&out_path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn pipeline_inside_a_redirected_group_counts_both_lines() {
        // `((echo a ; echo b) | wc -l) > outfile` - exercises Group, Sequence
        // and Pipe composing together, with the group's own redirection
        // capturing the pipeline's final stdout.
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("count.txt");
        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        let tree = parse(&format!(
            "((echo a ; echo b) | wc -l) > {}",
            out_path.display()
        ))
        .unwrap();
        let outcome = ShellExecutor::new(env).execute(tree.as_ref()).unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(0));

        let mut contents = String::new();
        std::fs::File::open(&out_path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents.trim(), "2");
    }

    #[test]
    fn killed_by_signal_reports_signal_offset() {
        // Built directly rather than through `parse`: this grammar has no
        // quoting, so `sh -c 'kill -TERM $$'` can't be expressed as a
        // single input line - `sh`'s own argument, not this shell's, needs
        // an embedded space.
        let tree = Node::Command {
            argv: vec!["sh".into(), "-c".into(), "kill -TERM $$".into()],
            redirections: RedirectionSet::default(),
        };
        let outcome = ShellExecutor::new(Environment::new()).execute(Some(&tree)).unwrap();
        assert_eq!(outcome, ExitOutcome::Signaled(15));
        assert_eq!(outcome.exit_code(), 128 + 15);
    }
}
