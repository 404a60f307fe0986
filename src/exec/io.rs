//! Stdio plumbing shared between the control-flow nodes of the executor.
//!
//! A [`Node::Command`](crate::ast::Node::Command) leaf needs a concrete
//! [`Stdio`] to spawn with, but that `Stdio` might come from three
//! unrelated places: the terminal (inherited), a redirected file, or one
//! end of a pipe feeding a sibling command. [`IoHandle`] unifies those so
//! the executor can thread "what should this subtree's stdin/stdout be"
//! down through the recursion without caring which case it is.
//!
//! Every real OS resource here (`File`, `os_pipe::PipeReader/Writer`)
//! supports `try_clone`, which duplicates the descriptor while sharing the
//! same underlying open file description - exactly the `dup2` semantics a
//! forking executor gets for free. That's what lets the same redirected
//! file, or the same pipe end, be handed to more than one spawned process
//! (for example both sides of `(echo a; echo b) > out.txt`) without
//! re-opening it and losing earlier output.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::Stdio;

use crate::ast::RedirectionSet;
use crate::error::ExecError;

pub enum IoHandle {
    Inherit,
    File(std::fs::File),
    PipeRead(os_pipe::PipeReader),
    PipeWrite(os_pipe::PipeWriter),
}

impl IoHandle {
    pub fn to_stdio(&self) -> io::Result<Stdio> {
        match self {
            IoHandle::Inherit => Ok(Stdio::inherit()),
            IoHandle::File(f) => Ok(f.try_clone()?.into()),
            IoHandle::PipeRead(p) => Ok(p.try_clone()?.into()),
            IoHandle::PipeWrite(p) => Ok(p.try_clone()?.into()),
        }
    }
}

/// Open the file named by `set.input`, if any, relative to `cwd`.
pub fn resolve_stdin(set: &RedirectionSet, cwd: &Path) -> Result<Option<IoHandle>, ExecError> {
    // Mirrors the outer `need_redirect` gate around the original
    // `check_redirection`: nothing to do at all when no slot is set.
    if set.is_empty() {
        return Ok(None);
    }
    let Some(path) = &set.input else {
        return Ok(None);
    };
    let file = OpenOptions::new().read(true).open(cwd.join(path))?;
    Ok(Some(IoHandle::File(file)))
}

/// Open the files named by `set.out` and `set.append`, if any, relative to
/// `cwd`.
///
/// Both are opened when both are present, even though only `append`'s
/// descriptor is returned: `out`'s truncate-or-create still happens as a
/// side effect on disk, matching the historical behavior of applying `>`
/// before `>>` and letting the latter win.
pub fn resolve_stdout(set: &RedirectionSet, cwd: &Path) -> Result<Option<IoHandle>, ExecError> {
    if set.is_empty() {
        return Ok(None);
    }
    let mut handle = None;
    if let Some(path) = &set.out {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(cwd.join(path))?;
        handle = Some(IoHandle::File(file));
    }
    if let Some(path) = &set.append {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(cwd.join(path))?;
        handle = Some(IoHandle::File(file));
    }
    Ok(handle)
}
