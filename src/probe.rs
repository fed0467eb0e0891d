//! C2 — Repository probe: read-only queries over a
//! checked-out working tree.

use std::collections::HashMap;
use std::path::Path;

use crate::gitmodules::parse_gitmodules_entries;
use crate::types::{CommitHash, SubmoduleReference};
use crate::vcs::VcsAdapter;

/// Read-only queries against a working tree. Holds no state of its own;
/// every call re-reads the repository at its current tip.
pub struct RepoProbe<'a> {
    vcs: &'a VcsAdapter,
}

impl<'a> RepoProbe<'a> {
    pub fn new(vcs: &'a VcsAdapter) -> Self {
        Self { vcs }
    }

    /// Unique branch names derived from the full branch listing: strips the
    /// `*` current-branch marker, skips detached-HEAD and HEAD-alias
    /// entries, and rewrites `remotes/origin/<x>` to `<x>`.
    pub fn list_branches(&self, repo: &Path) -> anyhow::Result<Vec<String>> {
        let output = self.vcs.run(&["branch", "-a"], repo, false)?;
        let mut seen = std::collections::BTreeSet::new();
        for raw_line in output.stdout_str().lines() {
            let line = raw_line.trim_start_matches('*').trim();
            if line.is_empty() {
                continue;
            }
            if line.contains("HEAD detached") || line.contains("-> ") {
                continue;
            }
            let name = line
                .strip_prefix("remotes/origin/")
                .unwrap_or(line)
                .to_owned();
            if name == "HEAD" {
                continue;
            }
            seen.insert(name);
        }
        Ok(seen.into_iter().collect())
    }

    /// The current branch name, or `None` if detached or ambiguous.
    pub fn head_branch(&self, repo: &Path) -> anyhow::Result<Option<String>> {
        let output = self.vcs.run(&["rev-parse", "--abbrev-ref", "HEAD"], repo, false)?;
        let name = output.stdout_trimmed();
        if name.is_empty() || name == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(name))
        }
    }

    /// The current commit hash.
    pub fn head_commit(&self, repo: &Path) -> anyhow::Result<CommitHash> {
        let output = self.vcs.run(&["rev-parse", "HEAD"], repo, false)?;
        Ok(CommitHash::new(output.stdout_trimmed()))
    }

    /// Parses `.gitmodules` and cross-references `git submodule status` to
    /// fill in commit hashes. `base_url`, when given, is
    /// the URL of the repository that declares these submodules, used to
    /// resolve any relative submodule URLs to absolute ones the way git
    /// itself resolves them against `remote.origin.url`.
    pub fn list_submodules(
        &self,
        repo: &Path,
        base_url: Option<&str>,
    ) -> anyhow::Result<Vec<SubmoduleReference>> {
        let gitmodules_path = repo.join(".gitmodules");
        let content = match std::fs::read(&gitmodules_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let entries = parse_gitmodules_entries(&content)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let status = match self.vcs.run(&["submodule", "status"], repo, true) {
            Ok(output) if output.success() => output,
            Ok(output) => {
                log::warn!(
                    "{}",
                    crate::log::scoped_message(format_args!(
                        "git submodule status failed in {}: {}",
                        repo.display(),
                        output.stderr_str().trim()
                    ))
                );
                return Ok(Vec::new());
            }
            Err(err) => {
                log::warn!(
                    "{}",
                    crate::log::scoped_message(format_args!(
                        "git submodule status failed in {}: {err}",
                        repo.display()
                    ))
                );
                return Ok(Vec::new());
            }
        };

        let hashes = parse_submodule_status(&status.stdout_str());

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let hash = hashes.get(&entry.path)?;
                let url = match base_url {
                    Some(base) => crate::gitmodules::resolve_submodule_url(base, &entry.url),
                    None => entry.url,
                };
                Some(SubmoduleReference::new(entry.path, url, hash.clone()))
            })
            .collect())
    }
}

/// Parses `git submodule status` output: each line is
/// `[+-]?<hash> <path>[ (<describe>)]`. Returns the hash with any leading
/// `+`/`-` stripped, keyed by path.
fn parse_submodule_status(output: &str) -> HashMap<String, CommitHash> {
    let mut hashes = HashMap::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(hash_token) = parts.next() else {
            continue;
        };
        let Some(path) = parts.next() else { continue };
        let hash = hash_token.trim_start_matches(['+', '-']);
        hashes.insert(path.to_owned(), CommitHash::new(hash));
    }
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_submodule_status() {
        let output = " 1234567890abcdef1234567890abcdef12345678 libA (heads/main)\n";
        let hashes = parse_submodule_status(output);
        assert_eq!(
            hashes.get("libA").map(CommitHash::as_str),
            Some("1234567890abcdef1234567890abcdef12345678")
        );
    }

    #[test]
    fn strips_leading_plus_and_minus() {
        let output = "+1111111111111111111111111111111111111111 libA (heads/main)\n\
             -2222222222222222222222222222222222222222 libB\n";
        let hashes = parse_submodule_status(output);
        assert_eq!(
            hashes.get("libA").map(CommitHash::as_str),
            Some("1111111111111111111111111111111111111111")
        );
        assert_eq!(
            hashes.get("libB").map(CommitHash::as_str),
            Some("2222222222222222222222222222222222222222")
        );
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert!(parse_submodule_status("\n\n").is_empty());
    }
}
