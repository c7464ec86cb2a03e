//! Launching external programs with redirected standard streams.
//!
//! [`launch`] consumes a resolved [`Invocation`]: it locates the program,
//! builds a child process carrying the session's variables and working
//! directory, rebinds stdin/stdout to the plan's targets before the program
//! runs, and then either waits (foreground) or reports the PID and returns
//! (background). Background children are fully relinquished — no handle is
//! retained and nothing ever waits on them.

use crate::ExitCode;
use crate::env::Environment;
use crate::parser::{Invocation, OutputMode};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// A launch that never got as far as running the program.
///
/// Each class carries the conventional shell status via [`exit_status`]:
/// 127 for a program that cannot be located, 126 for one that exists but
/// cannot be executed, 1 for everything else.
///
/// [`exit_status`]: LaunchError::exit_status
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{0}: permission denied")]
    PermissionDenied(String),
    /// The stdout target could not be opened; the program was never loaded.
    #[error("{target}: {source}")]
    Redirect {
        target: String,
        source: io::Error,
    },
    /// Process creation itself failed (resource exhaustion and kin).
    #[error("cannot start {command}: {source}")]
    Spawn {
        command: String,
        source: io::Error,
    },
    #[error("wait: {0}")]
    Wait(io::Error),
}

impl LaunchError {
    /// The status a shell would report for this failure class.
    pub fn exit_status(&self) -> ExitCode {
        match self {
            LaunchError::NotFound(_) => 127,
            LaunchError::PermissionDenied(_) => 126,
            _ => 1,
        }
    }
}

/// Launch an external command and apply the parent-side wait policy.
///
/// Foreground: blocks until this specific child terminates and returns its
/// exit code (128+signal if signal-terminated). Background: prints the PID
/// notification to stdout and returns 0 immediately, relinquishing the child.
pub fn launch(invocation: &Invocation<'_>, env: &Environment) -> Result<ExitCode, LaunchError> {
    // The resolver rejects empty vectors, so this is only defensive.
    let Some((&name, args)) = invocation.argv.split_first() else {
        return Ok(0);
    };

    let program =
        find_program(env, name).ok_or_else(|| LaunchError::NotFound(name.to_string()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .envs(&env.vars)
        .current_dir(env.current_dir());

    if let Some(target) = invocation.plan.input {
        // Degraded-input tolerance, carried over from the reference: an
        // unopenable input target leaves the child reading the inherited
        // stream rather than aborting the launch.
        if let Ok(file) = File::open(resolve_in_session(env, target)) {
            command.stdin(Stdio::from(file));
        }
    }

    if let Some((target, mode)) = invocation.plan.output {
        let file = open_output(&resolve_in_session(env, target), mode).map_err(|source| {
            LaunchError::Redirect {
                target: target.to_string(),
                source,
            }
        })?;
        command.stdout(Stdio::from(file));
    }

    let mut child = command.spawn().map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LaunchError::NotFound(name.to_string()),
        io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied(name.to_string()),
        _ => LaunchError::Spawn {
            command: name.to_string(),
            source,
        },
    })?;
    // Parent-side copies of the redirection files were dropped with the
    // builder's Stdio handles; nothing leaks past this line.

    if invocation.background {
        println!("[background] {}", child.id());
        return Ok(0);
    }

    let status = child.wait().map_err(LaunchError::Wait)?;
    Ok(exit_code(status))
}

/// Open a stdout redirection target with the shell's file semantics:
/// create if missing, permission bits 0644, truncating for `>` and
/// appending for `>>`.
fn open_output(path: &Path, mode: OutputMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match mode {
        OutputMode::Truncate => options.truncate(true),
        OutputMode::Append => options.append(true),
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

/// Anchor a possibly-relative path at the session's working directory.
///
/// The session directory and the process-global one can differ, so relative
/// redirect targets and program paths must not be left to the OS to resolve.
fn resolve_in_session(env: &Environment, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env.current_dir().join(path)
    }
}

/// Resolve a command name the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - Name containing a separator (e.g. `bin/tool`, `./tool`): resolved
///   against the session's working directory, returned if it exists.
/// - Bare name: each directory of the session's `PATH` variable is searched
///   in order and the first existing match wins.
/// - Empty name or no match: `None`.
pub fn find_program(env: &Environment, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }

    if path.components().nth(1).is_some() {
        let anchored = env.current_dir().join(path);
        return anchored.exists().then_some(anchored);
    }

    let search_paths = env.get_var("PATH")?;
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        // Signal-terminated children report 128+signal, shell convention.
        None => status.signal().map_or(-1, |sig| 128 + sig),
    }
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> ExitCode {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RedirectPlan;
    use std::collections::HashMap;
    use std::fs;

    fn env_with_path(search_paths: &str, current_dir: &Path) -> Environment {
        let mut vars = HashMap::new();
        vars.insert("PATH".to_string(), search_paths.to_string());
        Environment {
            vars,
            current_dir: current_dir.to_path_buf(),
            should_exit: false,
        }
    }

    #[test]
    #[cfg(unix)]
    fn finds_absolute_existing_program() {
        let env = env_with_path("/bin", Path::new("/"));
        let found = find_program(&env, "/bin/sh").expect("expected /bin/sh");
        assert_eq!(found, Path::new("/bin/sh"));
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexistent_program_is_none() {
        let env = env_with_path("/bin", Path::new("/"));
        assert!(find_program(&env, "/bin/nonexistent-program-xyz").is_none());
    }

    #[test]
    #[cfg(unix)]
    fn bare_name_is_searched_in_path_order() {
        let env = env_with_path("/bin:/usr/bin", Path::new("/"));
        let found = find_program(&env, "sh").expect("expected sh on PATH");
        assert!(found.ends_with("sh"), "unexpected match: {found:?}");
    }

    #[test]
    fn bare_name_missing_from_path_is_none() {
        let env = env_with_path("/bin", Path::new("/"));
        assert!(find_program(&env, "nonexistent-program-xyz").is_none());
    }

    #[test]
    fn bare_name_without_path_variable_is_none() {
        let env = Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
            should_exit: false,
        };
        assert!(find_program(&env, "sh").is_none());
    }

    #[test]
    fn empty_name_is_none() {
        let env = env_with_path("/bin", Path::new("/"));
        assert!(find_program(&env, "").is_none());
    }

    #[test]
    fn separator_names_resolve_against_the_session_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("bin")).unwrap();
        fs::write(temp.path().join("bin/tool"), b"").unwrap();

        // PATH is irrelevant for names with a separator.
        let env = env_with_path("/does/not/matter", temp.path());
        let found = find_program(&env, "bin/tool").expect("expected bin/tool");
        assert_eq!(found, temp.path().join("bin/tool"));

        assert!(find_program(&env, "bin/other").is_none());
    }

    #[test]
    #[cfg(unix)]
    fn foreground_launch_reports_the_child_status() {
        let env = env_with_path("/bin:/usr/bin", Path::new("/"));

        let ok = Invocation {
            argv: vec!["true"],
            plan: RedirectPlan::default(),
            background: false,
        };
        assert_eq!(launch(&ok, &env).unwrap(), 0);

        let fail = Invocation {
            argv: vec!["false"],
            plan: RedirectPlan::default(),
            background: false,
        };
        assert_ne!(launch(&fail, &env).unwrap(), 0);
    }

    #[test]
    fn unknown_program_is_a_not_found_error_with_status_127() {
        let env = env_with_path("/bin", Path::new("/"));
        let inv = Invocation {
            argv: vec!["nonexistent-program-xyz"],
            plan: RedirectPlan::default(),
            background: false,
        };

        let err = launch(&inv, &env).unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(_)));
        assert_eq!(err.exit_status(), 127);
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    #[cfg(unix)]
    fn output_redirection_writes_the_file_with_truncate_then_append() {
        let temp = tempfile::tempdir().unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        let first = Invocation {
            argv: vec!["echo", "hello"],
            plan: RedirectPlan {
                input: None,
                output: Some(("out.txt", OutputMode::Truncate)),
            },
            background: false,
        };
        assert_eq!(launch(&first, &env).unwrap(), 0);
        assert_eq!(fs::read_to_string(temp.path().join("out.txt")).unwrap(), "hello\n");

        let second = Invocation {
            argv: vec!["echo", "again"],
            plan: RedirectPlan {
                input: None,
                output: Some(("out.txt", OutputMode::Append)),
            },
            background: false,
        };
        assert_eq!(launch(&second, &env).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(temp.path().join("out.txt")).unwrap(),
            "hello\nagain\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn input_redirection_feeds_the_child() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("in.txt"), "from the file\n").unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        let inv = Invocation {
            argv: vec!["cat"],
            plan: RedirectPlan {
                input: Some("in.txt"),
                output: Some(("out.txt", OutputMode::Truncate)),
            },
            background: false,
        };
        assert_eq!(launch(&inv, &env).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(temp.path().join("out.txt")).unwrap(),
            "from the file\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn unopenable_output_target_aborts_the_launch() {
        let temp = tempfile::tempdir().unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        let inv = Invocation {
            argv: vec!["echo", "never"],
            plan: RedirectPlan {
                input: None,
                // Directory component does not exist, so the open fails.
                output: Some(("missing-dir/out.txt", OutputMode::Truncate)),
            },
            background: false,
        };

        let err = launch(&inv, &env).unwrap_err();
        assert!(matches!(err, LaunchError::Redirect { .. }));
        assert_eq!(err.exit_status(), 1);
        // The program never ran.
        assert!(!temp.path().join("missing-dir").exists());
    }

    #[test]
    #[cfg(unix)]
    fn unopenable_input_target_degrades_to_inherited_stdin() {
        let temp = tempfile::tempdir().unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        // `true` ignores stdin, so the degraded launch still succeeds.
        let inv = Invocation {
            argv: vec!["true"],
            plan: RedirectPlan {
                input: Some("no-such-input.txt"),
                output: None,
            },
            background: false,
        };
        assert_eq!(launch(&inv, &env).unwrap(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn redirection_targets_resolve_against_the_session_directory() {
        let temp = tempfile::tempdir().unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        let inv = Invocation {
            argv: vec!["echo", "anchored"],
            plan: RedirectPlan {
                input: None,
                output: Some(("rel.txt", OutputMode::Truncate)),
            },
            background: false,
        };
        assert_eq!(launch(&inv, &env).unwrap(), 0);
        // The file landed in the session directory, not the process cwd.
        assert!(temp.path().join("rel.txt").exists());
        assert!(!Path::new("rel.txt").exists());
    }

    #[test]
    #[cfg(unix)]
    fn output_file_is_created_with_0644() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let env = env_with_path("/bin:/usr/bin", temp.path());

        let inv = Invocation {
            argv: vec!["echo", "perm"],
            plan: RedirectPlan {
                input: None,
                output: Some(("mode.txt", OutputMode::Truncate)),
            },
            background: false,
        };
        assert_eq!(launch(&inv, &env).unwrap(), 0);

        let mode = fs::metadata(temp.path().join("mode.txt"))
            .unwrap()
            .permissions()
            .mode();
        // The process umask can only clear bits, never add them.
        assert_eq!(mode & 0o777 & !0o644, 0);
    }

    #[test]
    #[cfg(unix)]
    fn background_launch_returns_without_waiting() {
        use std::time::Instant;

        let env = env_with_path("/bin:/usr/bin", Path::new("/"));
        let inv = Invocation {
            argv: vec!["sleep", "5"],
            plan: RedirectPlan::default(),
            background: true,
        };

        let started = Instant::now();
        assert_eq!(launch(&inv, &env).unwrap(), 0);
        assert!(started.elapsed().as_secs() < 5, "background launch blocked");
    }
}
