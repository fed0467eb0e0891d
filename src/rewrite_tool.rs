//! External history-rewriting tool contract.
//!
//! Treated as a black box: a single invocation that moves every path in a
//! repository's history beneath a given prefix, preserving all commits. The
//! engine never reimplements history filtering in-process.

use std::path::Path;

use anyhow::Context;

use crate::vcs::VcsAdapter;

pub trait HistoryRewriter {
    /// Rewrites every path in `repo_path`'s history to live under
    /// `subdirectory`, in place.
    fn rewrite_to_subdirectory(&self, repo_path: &Path, subdirectory: &str) -> anyhow::Result<()>;

    /// The configured binary name or path, for the missing-history-rewriter
    /// preflight check run before any write.
    fn binary_name(&self) -> &str;
}

/// Whether `binary` can be found on `PATH`, or is itself an existing file (a
/// relative/absolute path override rather than a bare command name).
pub fn binary_is_available(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(binary).is_file();
    }
    std::env::var_os("PATH").is_some_and(|path_var| {
        std::env::split_paths(&path_var).any(|dir| dir.join(binary).is_file())
    })
}

/// Invokes the configured history-rewriting binary as
/// `<binary> --force --to-subdirectory-filter <path>`.
pub struct SubprocessHistoryRewriter {
    binary: String,
}

impl SubprocessHistoryRewriter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl HistoryRewriter for SubprocessHistoryRewriter {
    fn rewrite_to_subdirectory(&self, repo_path: &Path, subdirectory: &str) -> anyhow::Result<()> {
        // The history-rewriting tool is a distinct executable from the VCS
        // itself, but is invoked through the same narrow adapter so its
        // invocation is logged and errors surface uniformly.
        let adapter = VcsAdapter::with_binary(&self.binary);
        adapter
            .run(
                &["--force", "--to-subdirectory-filter", subdirectory],
                repo_path,
                false,
            )
            .with_context(|| {
                format!(
                    "history-rewriting tool failed for {} -> {subdirectory}",
                    repo_path.display()
                )
            })?;
        Ok(())
    }

    fn binary_name(&self) -> &str {
        &self.binary
    }
}
