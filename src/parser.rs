//! Redirection resolution: turning a raw argument vector into a launchable
//! invocation.
//!
//! The resolver scans the vector produced by [`crate::tokenizer`] for the
//! control tokens `<`, `>`, `>>` and a trailing `&`, strips them, and records
//! their side effects in an [`Invocation`]. The cleaned vector it yields is
//! what actually reaches the program loader — external programs never see
//! redirection operators among their arguments.

use thiserror::Error;

/// How the stdout target file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `>` — create the file if needed and truncate it.
    Truncate,
    /// `>>` — create the file if needed and append to it.
    Append,
}

/// Where the launched program's standard streams are rebound, if anywhere.
///
/// At most one entry per direction. When a direction is redirected more than
/// once on a line, the rightmost occurrence wins, matching the reference
/// behavior where the last descriptor duplication is the effective one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RedirectPlan<'a> {
    /// Target the program reads instead of the inherited stdin (`<`).
    pub input: Option<&'a str>,
    /// Target the program writes instead of the inherited stdout (`>`, `>>`).
    pub output: Option<(&'a str, OutputMode)>,
}

/// A fully resolved external command: cleaned argument vector, redirection
/// plan, and synchronization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Program name followed by its arguments, free of control tokens.
    pub argv: Vec<&'a str>,
    pub plan: RedirectPlan<'a>,
    /// True iff the final raw token was `&`: launch without waiting.
    pub background: bool,
}

/// A line the resolver refuses to launch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator appeared as the last token, with no target
    /// path following it.
    #[error("syntax error: missing redirect target after `{0}`")]
    MissingRedirectTarget(&'static str),
    /// Nothing remained once control tokens were stripped (e.g. `> file` or
    /// a bare `&`).
    #[error("syntax error: missing command")]
    EmptyCommand,
}

/// Resolve redirections and the background marker out of a raw token vector.
///
/// The background marker is a trailing-only signal: only the final token is
/// inspected, and an `&` anywhere else stays an ordinary argument. Operator
/// scanning is left to right; `<` and `>`/`>>` may appear in either order and
/// both apply to the same invocation.
pub fn resolve<'a>(tokens: &[&'a str]) -> Result<Invocation<'a>, ParseError> {
    let (tokens, background) = match tokens.split_last() {
        Some((&"&", rest)) => (rest, true),
        _ => (tokens, false),
    };

    let mut argv = Vec::with_capacity(tokens.len());
    let mut plan = RedirectPlan::default();

    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        match token {
            "<" => {
                let &target = iter.next().ok_or(ParseError::MissingRedirectTarget("<"))?;
                plan.input = Some(target);
            }
            ">" => {
                let &target = iter.next().ok_or(ParseError::MissingRedirectTarget(">"))?;
                plan.output = Some((target, OutputMode::Truncate));
            }
            ">>" => {
                let &target = iter.next().ok_or(ParseError::MissingRedirectTarget(">>"))?;
                plan.output = Some((target, OutputMode::Append));
            }
            _ => argv.push(token),
        }
    }

    if argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    Ok(Invocation { argv, plan, background })
}
