//! The interactive session loop.
//!
//! [`Interpreter`] owns the session [`Environment`] and drives one iteration
//! per input line: tokenize, classify, then either run a built-in in-process
//! or resolve redirections and hand the invocation to the external launcher.
//! Every failure is reported where it occurs on the error stream, prefixed
//! `mysh: `, and the loop continues; only `exit` and end-of-input terminate
//! the session.

use crate::ExitCode;
use crate::builtin;
use crate::env::Environment;
use crate::external;
use crate::parser;
use crate::tokenizer;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

const PROMPT: &str = "mysh> ";

/// A minimal interactive command interpreter.
///
/// Example
/// ```no_run
/// use mysh::Interpreter;
/// let mut shell = Interpreter::new();
/// let status = shell.dispatch("pwd");
/// assert_eq!(status, 0);
/// ```
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    /// Create an interpreter whose session starts as a snapshot of the
    /// current process environment.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// The session state. Exposed read-only; only dispatched commands
    /// mutate it.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The read-dispatch loop: prompt, read one line, dispatch, repeat.
    ///
    /// An interrupt at the prompt (Ctrl+C) is absorbed and a fresh prompt is
    /// issued — it never terminates the session. End-of-input (Ctrl+D) ends
    /// the session cleanly, equivalent to `exit`.
    pub fn repl(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    self.dispatch(&line);
                    if self.env.should_exit() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    eprintln!("mysh: {err}");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dispatch a single input line, writing built-in output to the real
    /// stdout. Returns the command's exit status (0 for an empty line).
    pub fn dispatch(&mut self, line: &str) -> ExitCode {
        self.dispatch_with_output(line, &mut std::io::stdout())
    }

    /// Dispatch with a caller-supplied stdout sink for built-in output.
    ///
    /// External commands still inherit the process's real streams (modulo
    /// their redirection plan); the sink exists so sessions can be driven
    /// and observed in tests.
    pub fn dispatch_with_output(&mut self, line: &str, stdout: &mut dyn Write) -> ExitCode {
        let tokens = tokenizer::split_into_tokens(line);
        if tokens.is_empty() {
            // Blank line: no classification, no process, fresh prompt.
            return 0;
        }

        if let Some(code) = builtin::dispatch(&mut self.env, stdout, &tokens) {
            return code;
        }

        let invocation = match parser::resolve(&tokens) {
            Ok(invocation) => invocation,
            Err(err) => {
                eprintln!("mysh: {err}");
                return 2;
            }
        };

        match external::launch(&invocation, &self.env) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("mysh: {err}");
                err.exit_status()
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
