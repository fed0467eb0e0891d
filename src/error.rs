//! Error taxonomy.
//!
//! Fatal categories are distinct `thiserror` types so the orchestrator and
//! CLI can `downcast_ref` an `anyhow::Error` back to its taxonomy tag and
//! choose an exit code. Tolerated conditions are never represented here:
//! they are logged and the caller proceeds.

use std::path::PathBuf;

/// Errors that must be detected before any write to the mono repository.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("history-rewriting tool {binary:?} not found on PATH")]
    MissingHistoryRewriter { binary: String },
    #[error("could not determine a default branch for {repo}")]
    IndeterminateDefaultBranch { repo: String },
    #[error("mono directory {path:?} is not empty")]
    NonEmptyMonoDirectory { path: PathBuf },
    #[error("malformed strategy file {path:?}: {source}")]
    MalformedStrategy {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed branch whitelist {path:?}: {source}")]
    MalformedWhitelist {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// A VCS command exited non-zero while invoked without `allow_failure`.
#[derive(Debug, thiserror::Error)]
#[error("command failed with status {exit_code}: {command}\n--- stderr ---\n{stderr}")]
pub struct VcsError {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Branch-closure planning could not proceed.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("submodule {path} has no default branch to substitute on mono branch {mono_branch}")]
    MissingSubDefaultBranch { path: String, mono_branch: String },
    #[error(
        "submodule {path} branch {branch} does not match the externally supplied expectation"
    )]
    UnexpectedBranch { path: String, branch: String },
}

/// A post-registration invariant did not hold.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error(
        "nested submodule {path} expected to be pinned at {expected} but tree inspection found {actual}"
    )]
    NestedSubmodulePinMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}
