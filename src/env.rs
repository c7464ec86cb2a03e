//! Session state carried across loop iterations.
//!
//! The [`Environment`] owns everything that outlives a single input line: the
//! variable snapshot handed to launched programs, the logical working
//! directory, and the exit request flag. The working directory is deliberately
//! session state rather than the process-global one, so `cd` in one session
//! never disturbs another (and test sessions can run in parallel); launched
//! children receive it as their starting directory at spawn time.

use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable session-level view of the process environment.
#[derive(Debug, Clone)]
pub struct Environment {
    pub(crate) vars: HashMap<String, String>,
    pub(crate) current_dir: PathBuf,
    pub(crate) should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a fresh session.
    ///
    /// Variables are copied from `std::env::vars()` and the working directory
    /// from `std::env::current_dir()`; after this point the session evolves
    /// independently of the process globals.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Look up a variable in the session snapshot.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable in the session snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The logical working directory: what `pwd` prints and where launched
    /// programs start.
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Replace the logical working directory. Only `cd` does this.
    pub fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    /// Ask the session loop to terminate before the next prompt.
    pub fn request_exit(&mut self) {
        self.should_exit = true;
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
