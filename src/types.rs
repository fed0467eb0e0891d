//! Core data model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A VCS commit hash, treated as an opaque string (never parsed as a number,
/// never assumed to be a particular length so that both full and abbreviated
/// forms round-trip).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitHash(String);

impl CommitHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommitHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CommitHash {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// `(path, url, commitHash)` with identity on `(path, url)` only.
///
/// `commitHash` is deliberately excluded from `PartialEq`/`Hash`/`Ord` below:
/// two references to the same submodule path+url pinned at different commits
/// must collapse to a single cache entry.
#[derive(Clone, Debug)]
pub struct SubmoduleReference {
    /// Repo-relative path, forward slashes, non-empty.
    pub path: String,
    pub url: String,
    pub commit: CommitHash,
}

impl SubmoduleReference {
    pub fn new(path: impl Into<String>, url: impl Into<String>, commit: CommitHash) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            commit,
        }
    }

    fn identity(&self) -> (&str, &str) {
        (&self.path, &self.url)
    }
}

impl PartialEq for SubmoduleReference {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for SubmoduleReference {}

impl std::hash::Hash for SubmoduleReference {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for SubmoduleReference {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubmoduleReference {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Mapping from meta-branch name to the commit it pointed at immediately
/// before any bookkeeping commit was appended in the mono. Populated once by
/// the meta importer, read-only thereafter.
#[derive(Clone, Debug, Default)]
pub struct MetaBranchCommits(pub BTreeMap<String, CommitHash>);

impl MetaBranchCommits {
    pub fn insert(&mut self, branch: impl Into<String>, commit: CommitHash) {
        self.0.insert(branch.into(), commit);
    }

    pub fn get(&self, branch: &str) -> Option<&CommitHash> {
        self.0.get(branch)
    }
}

/// One successful `(submodule, mono-branch)` import.
#[derive(Clone, Debug)]
pub struct SubmoduleImportEntry {
    pub mono_branch: String,
    pub meta_branch: String,
    pub meta_commit: CommitHash,
    pub sub_branch: String,
    pub sub_commit: CommitHash,
    pub nested: Vec<SubmoduleReference>,
}

/// All entries recorded for one submodule path across every mono branch it
/// was imported into.
#[derive(Clone, Debug)]
pub struct SubmoduleImportInfo {
    pub relative_path: String,
    pub default_branch: String,
    pub entries: Vec<SubmoduleImportEntry>,
}

/// The full per-run import record, keyed by submodule path, fed to the report
/// aggregator.
#[derive(Clone, Debug)]
pub struct MigrationImportInfo {
    pub meta_default_branch: String,
    pub meta_name: String,
    pub mono_name: String,
    pub submodules: BTreeMap<String, SubmoduleImportInfo>,
}

/// `(head, tail)`: `head` is the newest commit (tip), `tail` the oldest,
/// both inclusive and contiguous along first-parent ancestry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRange {
    pub head: CommitHash,
    pub tail: CommitHash,
}

/// Fixed textual prefix placed at the start of every commit message the
/// engine creates, used by the squash pass to identify collapsible commits.
pub const BOOKKEEPING_MARKER: &str = "[monomerge]";

#[cfg(test)]
mod tests {
    use super::*;

    /// Two references to the same `(path, url)` pinned at different commits
    /// must collapse to one cache entry.
    #[test]
    fn identity_ignores_commit_hash() {
        let a = SubmoduleReference::new("libA", "https://example.invalid/libA", CommitHash::new("h1"));
        let b = SubmoduleReference::new("libA", "https://example.invalid/libA", CommitHash::new("h2"));
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn differing_path_or_url_is_distinct_identity() {
        let a = SubmoduleReference::new("libA", "https://example.invalid/libA", CommitHash::new("h1"));
        let b = SubmoduleReference::new("libB", "https://example.invalid/libA", CommitHash::new("h1"));
        let c = SubmoduleReference::new("libA", "https://example.invalid/other", CommitHash::new("h1"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
