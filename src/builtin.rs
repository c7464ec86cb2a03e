//! Built-in commands and their dispatch.
//!
//! Built-ins run inside the interpreter's own process: no child is created
//! and control always returns to the session loop. The set is fixed at
//! compile time — `exit`, `cd`, `pwd` — and [`dispatch`] is the command
//! classifier: it matches the head of the argument vector against that set
//! and executes the built-in if one matches, leaving everything else to the
//! external launcher.
//!
//! Arguments are parsed with [`argh`], so each built-in gets usage checking
//! and `--help` output without hand-rolled flag handling.

use crate::ExitCode;
use crate::env::Environment;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// A command implemented inside the interpreter.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name, e.g. "cd".
    fn name() -> &'static str;

    /// Execute in-process. Normal output goes to `stdout`; failures are
    /// returned and reported by the caller on the error stream. The return
    /// value follows shell conventions: 0 for success, non-zero otherwise.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Classify and run a built-in.
///
/// Returns `Some(status)` when the first token names a built-in (which has
/// then been executed, successfully or not), and `None` when the command is
/// external. The match is an exact string comparison against a closed set.
pub(crate) fn dispatch(
    env: &mut Environment,
    stdout: &mut dyn Write,
    argv: &[&str],
) -> Option<ExitCode> {
    let (name, args) = argv.split_first()?;
    match *name {
        "exit" => Some(run::<Exit>(args, stdout, env)),
        "cd" => Some(run::<Cd>(args, stdout, env)),
        "pwd" => Some(run::<Pwd>(args, stdout, env)),
        _ => None,
    }
}

/// Parse arguments and execute one built-in, reporting failures in place.
fn run<T: BuiltinCommand>(args: &[&str], stdout: &mut dyn Write, env: &mut Environment) -> ExitCode {
    match T::from_args(&[T::name()], args) {
        Ok(cmd) => match cmd.execute(stdout, env) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("mysh: {err:#}");
                1
            }
        },
        // argh bails out early for --help (status Ok) and usage errors.
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                let _ = writeln!(stdout, "{output}");
                0
            }
            Err(()) => {
                eprintln!("mysh: {output}");
                1
            }
        },
    }
}

#[derive(FromArgs)]
/// Terminate the session.
pub(crate) struct Exit {
    #[argh(positional, greedy)]
    /// ignored; present so `exit 1` still exits instead of tripping a usage error.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.request_exit();
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the session's working directory.
pub(crate) struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current one; $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => bail!("cd: HOME not set"),
            },
        };

        let resolved = if target.is_absolute() {
            target
        } else {
            env.current_dir().join(target)
        };

        // Canonicalize before storing so `pwd` never prints a path with
        // `..` segments or dangling symlinks in it. On failure the working
        // directory is left unchanged.
        let canonical = fs::canonicalize(&resolved)
            .with_context(|| format!("cd: {}", resolved.display()))?;
        if !canonical.is_dir() {
            bail!("cd: {}: not a directory", canonical.display());
        }

        env.set_current_dir(canonical);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the session's working directory.
pub(crate) struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir().display()).context("pwd")?;
        Ok(0)
    }
}
