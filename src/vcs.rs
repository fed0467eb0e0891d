//! C1 — VCS adapter.
//!
//! A single narrow operation, [`VcsAdapter::run`], wraps every interaction
//! with the underlying `git` executable. Everything the rest of the engine
//! needs (branch listing, checkout, commit, ...) is built as a thin
//! convenience wrapper around `run` in the components that need it (C2-C8),
//! not inlined here: the adapter itself stays a narrow command interface.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

use anyhow::Context;

use crate::error::VcsError;

/// Captured result of a single command invocation.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Trimmed stdout, convenient for single-line queries like `rev-parse`.
    pub fn stdout_trimmed(&self) -> String {
        self.stdout_str().trim().to_owned()
    }

    /// Stdout split into non-empty trimmed lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout_str()
            .lines()
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Narrow command interface over a local VCS executable.
#[derive(Clone, Debug)]
pub struct VcsAdapter {
    binary: OsString,
}

impl Default for VcsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsAdapter {
    pub fn new() -> Self {
        Self {
            binary: OsString::from("git"),
        }
    }

    pub fn with_binary(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Runs `<binary> <args>` in `working_dir`. Verbosity (logging) and
    /// stream capture are always on; whether a non-zero exit is fatal is
    /// controlled by `allow_failure`.
    pub fn run(
        &self,
        args: &[&str],
        working_dir: &Path,
        allow_failure: bool,
    ) -> anyhow::Result<CommandOutput> {
        let mut command = Command::new(&self.binary);
        command.args(args).current_dir(working_dir);

        let command_line = command_to_string_lossy(&self.binary, args);
        let span = tracing::debug_span!("vcs_command", command = %command_line, cwd = %working_dir.display());
        let _entered = span.enter();
        tracing::debug!("running: {command_line}");

        let output = command
            .output()
            .with_context(|| format!("failed to spawn `{command_line}`"))?;
        let exit_code = output.status.code().unwrap_or(-1);
        tracing::trace!(exit_code, "command finished");

        let result = CommandOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if !result.success() && !allow_failure {
            return Err(VcsError {
                command: command_line,
                exit_code,
                stdout: result.stdout_str(),
                stderr: result.stderr_str(),
            }
            .into());
        }
        Ok(result)
    }
}

/// Renders a command line for logging, shell-quoting any argument containing
/// whitespace or shell metacharacters so the printed line can be pasted back
/// into a shell verbatim.
///
/// ```
/// # use git_monomerge::vcs::command_to_string_lossy;
/// assert_eq!(
///     command_to_string_lossy("git", &["commit", "-m", "hello world"]),
///     r#"git commit -m "hello world""#
/// );
/// assert_eq!(
///     command_to_string_lossy("git", &["status"]),
///     "git status"
/// );
/// ```
pub fn command_to_string_lossy(binary: impl AsRef<OsStr>, args: &[&str]) -> String {
    let mut parts = vec![binary.as_ref().to_string_lossy().into_owned()];
    parts.extend(args.iter().map(|arg| format_arg_lossy(arg)));
    parts.join(" ")
}

fn format_arg_lossy(arg: &str) -> String {
    if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "\"'$`\\".contains(c)) {
        format!("{arg:?}")
    } else {
        arg.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_args_are_unquoted() {
        assert_eq!(
            command_to_string_lossy("git", &["branch", "-a"]),
            "git branch -a"
        );
    }

    #[test]
    fn whitespace_triggers_quoting() {
        assert_eq!(
            command_to_string_lossy("git", &["commit", "-m", "a b"]),
            r#"git commit -m "a b""#
        );
    }

    #[test]
    fn run_reports_vcs_error_on_nonzero_exit() {
        let adapter = VcsAdapter::new();
        let dir = tempfile::tempdir().unwrap();
        let err = adapter
            .run(&["this-is-not-a-git-subcommand"], dir.path(), false)
            .unwrap_err();
        let vcs_err = err.downcast_ref::<VcsError>().expect("VcsError");
        assert_ne!(vcs_err.exit_code, 0);
    }

    #[test]
    fn allow_failure_suppresses_error() {
        let adapter = VcsAdapter::new();
        let dir = tempfile::tempdir().unwrap();
        let output = adapter
            .run(&["this-is-not-a-git-subcommand"], dir.path(), true)
            .unwrap();
        assert!(!output.success());
    }
}
