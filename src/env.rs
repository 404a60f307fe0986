use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Ambient configuration for spawned processes: a working directory and an
/// optional set of environment variable overrides.
///
/// The core never reads these itself - there is no variable expansion or
/// `cd` builtin here - but every process it spawns inherits them, the way
/// any process launcher needs *some* notion of "where" and "with what
/// environment" even when it does no text substitution of its own.
///
/// Note: fields are public for simplicity, matching the rest of this crate.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Overrides merged on top of the shell's own inherited environment.
    pub vars: HashMap<String, String>,
    /// The working directory new processes are spawned in.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process's own directory; no variable overrides.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
        }
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_captures_current_dir() {
        let env = Environment::new();
        assert_eq!(env.current_dir, stdenv::current_dir().unwrap());
        assert!(env.vars.is_empty());
    }

    #[test]
    fn set_var_overrides() {
        let mut env = Environment::new();
        env.set_var("FOO", "bar");
        assert_eq!(env.vars.get("FOO").map(String::as_str), Some("bar"));
    }
}
