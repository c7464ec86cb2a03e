//! A small interactive command interpreter.
//!
//! This crate reads one line at a time, decides whether it names a built-in
//! facility (`exit`, `cd`, `pwd`) or an external program, and executes it
//! with optional stdin/stdout redirection (`<`, `>`, `>>`) and optional
//! background execution (trailing `&`). There is deliberately no piping, no
//! job control, no quoting, and no scripting — the interesting part is the
//! dispatch and process-execution pipeline itself.
//!
//! The main entry point is [`Interpreter`], which owns the session state and
//! drives the tokenizer → classifier → resolver → launcher pipeline once per
//! input line. The public modules expose the pipeline's pieces for reuse and
//! testing.

mod builtin;
pub mod env;
pub mod external;
mod interpreter;
pub mod parser;
pub mod tokenizer;

pub use interpreter::Interpreter;

/// Conventional process exit code: 0 for success, non-zero for failure.
///
/// Mirrors the convention used by POSIX shells — 127 marks a program that
/// could not be located, 126 one that could not be executed, 128+N a death
/// by signal N.
pub type ExitCode = i32;
