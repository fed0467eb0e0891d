//! C3 — Monorepo cache.
//!
//! The only component permitted to perform a branch-changing checkout in the
//! mono during the submodule import phase. `(path, url)`-only identity on
//! [`SubmoduleReference`] is what makes `get_branches_tracking_submodule`
//! meaningful across branches that pin the same submodule at different
//! commits.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::probe::RepoProbe;
use crate::types::SubmoduleReference;
use crate::vcs::VcsAdapter;

pub struct MonorepoCache<'a> {
    vcs: &'a VcsAdapter,
    mono_root: PathBuf,
    /// The meta repository's own location. Submodule gitlinks found in a
    /// freshly-imported mono branch are copied verbatim from the meta
    /// branch's `.gitmodules`, so any relative URL among them must be
    /// resolved against the meta's URL, not the mono's (the mono has none).
    meta_base_url: Option<String>,
    branches: Option<HashSet<String>>,
    submodules_by_branch: HashMap<String, Vec<SubmoduleReference>>,
    scanned_branches: HashSet<String>,
}

impl<'a> MonorepoCache<'a> {
    pub fn new(vcs: &'a VcsAdapter, mono_root: PathBuf) -> Self {
        Self::with_meta_base_url(vcs, mono_root, None)
    }

    pub fn with_meta_base_url(
        vcs: &'a VcsAdapter,
        mono_root: PathBuf,
        meta_base_url: Option<String>,
    ) -> Self {
        Self {
            vcs,
            mono_root,
            meta_base_url,
            branches: None,
            submodules_by_branch: HashMap::new(),
            scanned_branches: HashSet::new(),
        }
    }

    fn probe(&self) -> RepoProbe<'a> {
        RepoProbe::new(self.vcs)
    }

    /// Memoized branch set, recomputed only on `force_refresh`.
    pub fn get_branches(&mut self, force_refresh: bool) -> anyhow::Result<&HashSet<String>> {
        if force_refresh || self.branches.is_none() {
            let branches = self.probe().list_branches(&self.mono_root)?;
            self.branches = Some(branches.into_iter().collect());
        }
        Ok(self.branches.as_ref().expect("populated above"))
    }

    /// Registers a branch created during this session so it is visible
    /// without a force-refresh.
    pub fn add_branch(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.branches.get_or_insert_with(HashSet::new).insert(name);
    }

    /// If `b` has not been scanned yet, checks it out (with recursive
    /// submodule update), enumerates its submodules, restores the working
    /// tree, and caches the result.
    pub fn get_submodules_in_branch(
        &mut self,
        branch: &str,
        force_refresh: bool,
    ) -> anyhow::Result<&[SubmoduleReference]> {
        if force_refresh {
            self.scanned_branches.remove(branch);
        }
        if !self.scanned_branches.contains(branch) {
            let submodules = self.with_branch(branch, |cache| {
                let base_url = cache.meta_base_url.as_deref();
                cache.probe().list_submodules(&cache.mono_root, base_url)
            })?;
            self.submodules_by_branch
                .insert(branch.to_owned(), submodules);
            self.scanned_branches.insert(branch.to_owned());
        }
        Ok(self
            .submodules_by_branch
            .get(branch)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Ensures every known branch has been scanned, then returns the
    /// branches whose tracked submodules include `path`.
    pub fn get_branches_tracking_submodule(
        &mut self,
        path: &str,
    ) -> anyhow::Result<BTreeSet<String>> {
        let branches: Vec<String> = self.get_branches(false)?.iter().cloned().collect();
        for branch in &branches {
            self.get_submodules_in_branch(branch, false)?;
        }
        Ok(branches
            .into_iter()
            .filter(|b| {
                self.submodules_by_branch
                    .get(b)
                    .is_some_and(|subs| subs.iter().any(|s| s.path == path))
            })
            .collect())
    }

    /// Drops `b` from the scanned set, forcing the next
    /// `get_submodules_in_branch` call to re-checkout and re-scan it.
    pub fn invalidate_branch(&mut self, branch: &str) {
        self.scanned_branches.remove(branch);
        self.submodules_by_branch.remove(branch);
    }

    /// Scoped checkout: switches to `branch`, runs `f`, then restores
    /// whatever branch was checked out before, on every exit path —
    /// including a panic unwinding out of `f`.
    pub fn with_branch<T>(
        &mut self,
        branch: &str,
        f: impl FnOnce(&mut Self) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let previous = self.probe().head_branch(&self.mono_root)?;
        self.vcs.run(
            &["checkout", branch, "--recurse-submodules"],
            &self.mono_root,
            false,
        )?;
        let guard = RestoreOnDrop {
            vcs: self.vcs,
            mono_root: self.mono_root.clone(),
            previous,
            restored: false,
        };
        let result = f(self);
        guard.restore()?;
        result
    }

    pub fn mono_root(&self) -> &Path {
        &self.mono_root
    }
}

/// RAII companion to [`MonorepoCache::with_branch`]. `restore()` performs the
/// normal, error-propagating restore and marks itself done; if it's never
/// called (`f` panicked and unwound past it) `Drop` falls back to a
/// best-effort, failure-tolerant restore so the mono is never left mid-unwind
/// on the wrong branch.
struct RestoreOnDrop<'a> {
    vcs: &'a VcsAdapter,
    mono_root: PathBuf,
    previous: Option<String>,
    restored: bool,
}

impl RestoreOnDrop<'_> {
    fn restore(mut self) -> anyhow::Result<()> {
        self.restored = true;
        if let Some(previous) = &self.previous {
            self.vcs.run(
                &["checkout", previous, "--recurse-submodules"],
                &self.mono_root,
                false,
            )?;
        }
        Ok(())
    }
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Some(previous) = &self.previous {
            let _ = self.vcs.run(
                &["checkout", previous, "--recurse-submodules"],
                &self.mono_root,
                true,
            );
        }
    }
}
