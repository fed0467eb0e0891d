//! C5 — Submodule importer: the core per-submodule state
//! machine. Computes the branch closure, classifies every branch of the
//! closure into one of four cases, pre-creates missing mono branches, and for each
//! surviving branch clones, rewrites, and merges the submodule's content in,
//! then re-registers any nested submodules one level up.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::Context;

use crate::cache::MonorepoCache;
use crate::error::{IntegrityError, PlanningError};
use crate::probe::RepoProbe;
use crate::rewrite_tool::HistoryRewriter;
use crate::types::{
    CommitHash, MetaBranchCommits, SubmoduleImportEntry, SubmoduleImportInfo, SubmoduleReference,
};
use crate::vcs::VcsAdapter;
use crate::workspace::Sandbox;

const TRANSIENT_REMOTE_NAME: &str = "monomerge-sub-import";

/// The four-way branch classification, named explicitly and matched
/// exhaustively rather than handled with booleans.
#[derive(Clone, Debug, PartialEq, Eq)]
enum BranchClassification {
    Skip,
    SameName,
    SubstituteSub { sub_default_branch: String },
    CreateMono,
}

fn classify(
    in_mono: bool,
    in_sub: bool,
    is_tracked: bool,
    default_tracks: bool,
    sub_default_branch: &str,
) -> BranchClassification {
    if (in_mono && !is_tracked) || (!in_mono && !default_tracks) {
        BranchClassification::Skip
    } else if in_mono && is_tracked && in_sub {
        BranchClassification::SameName
    } else if in_mono && is_tracked {
        BranchClassification::SubstituteSub {
            sub_default_branch: sub_default_branch.to_owned(),
        }
    } else if default_tracks && in_sub {
        BranchClassification::CreateMono
    } else {
        BranchClassification::Skip
    }
}

pub struct SubmoduleImporter<'a> {
    vcs: &'a VcsAdapter,
    rewriter: &'a dyn HistoryRewriter,
    bookkeeping_marker: &'a str,
    sandbox: &'a Sandbox,
}

impl<'a> SubmoduleImporter<'a> {
    pub fn new(
        vcs: &'a VcsAdapter,
        rewriter: &'a dyn HistoryRewriter,
        bookkeeping_marker: &'a str,
        sandbox: &'a Sandbox,
    ) -> Self {
        Self {
            vcs,
            rewriter,
            bookkeeping_marker,
            sandbox,
        }
    }

    /// Runs the full state machine for one submodule against every branch of
    /// its closure with the mono.
    pub fn import(
        &self,
        cache: &mut MonorepoCache,
        submodule: &SubmoduleReference,
        meta_default_branch: &str,
        meta_branch_commits: &MetaBranchCommits,
        whitelist: Option<&[String]>,
    ) -> anyhow::Result<SubmoduleImportInfo> {
        let _scope = crate::log::scope(submodule.path.clone());
        let probe = RepoProbe::new(self.vcs);

        // 4.5.1 Preparation: a single full clone, captured default branch and
        // branch set, local branches materialized for every remote branch.
        let scratch_dir = self.sandbox.child(&sanitize_dir_name(&submodule.path));
        self.vcs
            .run(
                &["clone", &submodule.url, &scratch_dir.to_string_lossy()],
                self.sandbox.path(),
                false,
            )
            .with_context(|| {
                format!(
                    "failed to clone submodule {} from {}",
                    submodule.path, submodule.url
                )
            })?;

        let sub_default_branch = probe.head_branch(&scratch_dir)?.ok_or_else(|| {
            anyhow::anyhow!(
                "submodule {} has no determinable default branch",
                submodule.path
            )
        })?;
        let sub_branches: BTreeSet<String> =
            probe.list_branches(&scratch_dir)?.into_iter().collect();

        for branch in &sub_branches {
            if branch == &sub_default_branch {
                continue;
            }
            self.vcs.run(
                &["branch", "--track", branch, &format!("origin/{branch}")],
                &scratch_dir,
                true,
            )?;
        }

        let tracked_by = cache.get_branches_tracking_submodule(&submodule.path)?;
        let default_tracks = tracked_by.contains(meta_default_branch);

        let mono_branches_all: BTreeSet<String> =
            cache.get_branches(false)?.iter().cloned().collect();
        let whitelist_set: Option<BTreeSet<&str>> =
            whitelist.map(|w| w.iter().map(String::as_str).collect());
        let apply_whitelist = |branches: &BTreeSet<String>, default_branch: &str| {
            let keep = |b: &str| {
                b == default_branch
                    || whitelist_set
                        .as_ref()
                        .map(|allowed| allowed.contains(b))
                        .unwrap_or(true)
            };
            branches
                .iter()
                .filter(|b| keep(b))
                .cloned()
                .collect::<BTreeSet<String>>()
        };
        let mono_branches = apply_whitelist(&mono_branches_all, meta_default_branch);
        let sub_branches_for_closure = apply_whitelist(&sub_branches, &sub_default_branch);

        // Branch closure: mono branches union submodule branches, both after
        // whitelist filtering plus the relevant default branches
        //.
        let closure: BTreeSet<String> = mono_branches
            .union(&sub_branches_for_closure)
            .cloned()
            .collect();

        // 4.5.2 classification. Deterministic order by branch name so
        // pre-creation and import both proceed reproducibly.
        let mut classifications = Vec::new();
        for branch in &closure {
            let classification = classify(
                mono_branches.contains(branch),
                sub_branches.contains(branch),
                tracked_by.contains(branch),
                default_tracks,
                &sub_default_branch,
            );
            classifications.push((branch.clone(), classification));
        }

        // 4.5.3 Pre-creation: every Case-4 branch is created from the meta
        // default tip before any import begins, and registered with the
        // cache immediately.
        for (branch, classification) in &classifications {
            if matches!(classification, BranchClassification::CreateMono) {
                let mono_root = cache.mono_root().to_owned();
                cache.with_branch(meta_default_branch, |_cache| {
                    self.vcs
                        .run(&["checkout", "-B", branch], &mono_root, false)
                })?;
                cache.add_branch(branch.clone());
            }
        }

        let mut entries = Vec::new();
        for (branch, classification) in &classifications {
            let sub_branch = match classification {
                BranchClassification::Skip => continue,
                BranchClassification::SameName | BranchClassification::CreateMono => {
                    branch.clone()
                }
                BranchClassification::SubstituteSub { sub_default_branch } => {
                    if !sub_branches.contains(sub_default_branch) {
                        return Err(PlanningError::MissingSubDefaultBranch {
                            path: submodule.path.clone(),
                            mono_branch: branch.clone(),
                        }
                        .into());
                    }
                    sub_default_branch.clone()
                }
            };

            let _branch_scope = crate::log::scope(branch.clone());
            // Fresh per branch: each per-branch single-branch-clone ->
            // rewrite -> merge re-introduces `S.path/.gitmodules`, so the
            // removal must happen again on every branch visited, not just
            // the first.
            let mut gitmodules_removed_for: HashSet<String> = HashSet::new();
            let entry = self.import_one_branch(
                cache,
                &scratch_dir,
                submodule,
                branch,
                &sub_branch,
                meta_default_branch,
                meta_branch_commits,
                &mut gitmodules_removed_for,
            )?;
            entries.push(entry);
        }

        Ok(SubmoduleImportInfo {
            relative_path: submodule.path.clone(),
            default_branch: sub_default_branch,
            entries,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn import_one_branch(
        &self,
        cache: &mut MonorepoCache,
        scratch_dir: &Path,
        submodule: &SubmoduleReference,
        mono_branch: &str,
        sub_branch: &str,
        meta_default_branch: &str,
        meta_branch_commits: &MetaBranchCommits,
        gitmodules_removed_for: &mut HashSet<String>,
    ) -> anyhow::Result<SubmoduleImportEntry> {
        let probe = RepoProbe::new(self.vcs);
        let mono_root = cache.mono_root().to_owned();

        // Step 1: clean uncommitted changes.
        let clean = self.vcs.run(&["clean", "-fd"], &mono_root, true)?;
        if !clean.success() {
            log::warn!(
                "{}",
                crate::log::scoped_message(format_args!(
                    "git clean failed in {}: {}",
                    mono_root.display(),
                    clean.stderr_str().trim()
                ))
            );
        }

        // Step 3: single-branch clone into an isolated workspace.
        let isolated = self.sandbox.child(&sanitize_dir_name(&format!(
            "{}--{mono_branch}",
            submodule.path
        )));
        self.vcs.run(
            &[
                "clone",
                "--single-branch",
                "--branch",
                sub_branch,
                &scratch_dir.to_string_lossy(),
                &isolated.to_string_lossy(),
            ],
            self.sandbox.path(),
            false,
        )?;
        let sub_commit = probe.head_commit(&isolated)?;
        // Relative nested-submodule URLs are resolved against `submodule`'s
        // own URL, not `isolated`'s local `origin` remote (which points at
        // the scratch clone on disk, not the real upstream).
        let nested = probe.list_submodules(&isolated, Some(&submodule.url))?;

        // Step 4: determine which meta branch this entry reports against.
        let meta_branch_used = if meta_branch_commits.get(mono_branch).is_some() {
            mono_branch.to_owned()
        } else {
            meta_default_branch.to_owned()
        };
        let meta_commit = meta_branch_commits
            .get(&meta_branch_used)
            .cloned()
            .unwrap_or_else(|| CommitHash::new(""));

        let entry = SubmoduleImportEntry {
            mono_branch: mono_branch.to_owned(),
            meta_branch: meta_branch_used,
            meta_commit,
            sub_branch: sub_branch.to_owned(),
            sub_commit: sub_commit.clone(),
            nested: nested.clone(),
        };

        // Step 6: rewrite the isolated clone's history to live under
        // `submodule.path`.
        self.rewriter
            .rewrite_to_subdirectory(&isolated, &submodule.path)?;

        let isolated_url = isolated.to_string_lossy().into_owned();
        cache.with_branch(mono_branch, |cache| {
            let mono_root = cache.mono_root().to_owned();

            // Step 7: remove whatever is already registered at the submodule
            // path (e.g. the gitlink placeholder inherited from the meta
            // repo's own .gitmodules) before merging real content in.
            let existing = self
                .vcs
                .run(&["ls-tree", "HEAD", "--", &submodule.path], &mono_root, false)?;
            if !existing.stdout_str().trim().is_empty() {
                self.vcs
                    .run(&["rm", "-rf", &submodule.path], &mono_root, false)?;
                let message = format!(
                    "{} remove stale {} before importing",
                    self.bookkeeping_marker, submodule.path
                );
                self.vcs.run(&["commit", "-m", &message], &mono_root, false)?;
            }

            // Step 8: merge the rewritten isolated clone in.
            self.vcs.run(
                &["remote", "add", TRANSIENT_REMOTE_NAME, &isolated_url],
                &mono_root,
                false,
            )?;
            let fetch_result = self.vcs.run(
                &[
                    "fetch",
                    TRANSIENT_REMOTE_NAME,
                    &format!("{sub_branch}:refs/monomerge-fetch/{sub_branch}"),
                ],
                &mono_root,
                true,
            );
            self.vcs
                .run(&["remote", "remove", TRANSIENT_REMOTE_NAME], &mono_root, true)?;
            fetch_result?.success().then_some(()).ok_or_else(|| {
                anyhow::anyhow!(
                    "failed to fetch rewritten {} from {}",
                    submodule.path,
                    isolated.display()
                )
            })?;

            let message = format!(
                "{} import submodule {} ({sub_branch}@{sub_commit})",
                self.bookkeeping_marker, submodule.path
            );
            self.vcs.run(
                &[
                    "merge",
                    "--allow-unrelated-histories",
                    "-m",
                    &message,
                    &format!("refs/monomerge-fetch/{sub_branch}"),
                ],
                &mono_root,
                false,
            )?;
            self.vcs.run(
                &["update-ref", "-d", &format!("refs/monomerge-fetch/{sub_branch}")],
                &mono_root,
                true,
            )?;

            // Step 9: re-register any nested submodules one level up.
            self.reregister_nested(cache, submodule, &nested, gitmodules_removed_for)
        })?;

        Ok(entry)
    }

    fn reregister_nested(
        &self,
        cache: &mut MonorepoCache,
        submodule: &SubmoduleReference,
        nested: &[SubmoduleReference],
        gitmodules_removed_for: &mut HashSet<String>,
    ) -> anyhow::Result<()> {
        let mono_root = cache.mono_root().to_owned();
        let nested_gitmodules = format!("{}/.gitmodules", submodule.path);

        // Only once per importer-visit of `S.path/b`: `gitmodules_removed_for`
        // is freshly allocated per branch by the caller, so this fires once
        // per (submodule, branch) pair even though the branch's own
        // `.gitmodules` was just re-introduced by this visit's merge.
        if gitmodules_removed_for.insert(nested_gitmodules.clone())
            && mono_root.join(&nested_gitmodules).exists()
        {
            self.vcs
                .run(&["rm", "-f", &nested_gitmodules], &mono_root, false)?;
            let message = format!(
                "{} drop nested submodule config at {nested_gitmodules}",
                self.bookkeeping_marker
            );
            self.vcs.run(&["commit", "-m", &message], &mono_root, false)?;
        }

        for nested_ref in nested {
            let full_path = format!("{}/{}", submodule.path, nested_ref.path);
            if mono_root.join(&full_path).exists() {
                self.vcs
                    .run(&["rm", "-rf", &full_path], &mono_root, false)?;
                let message = format!(
                    "{} remove stale nested path {full_path}",
                    self.bookkeeping_marker
                );
                self.vcs.run(&["commit", "-m", &message], &mono_root, false)?;
            }

            self.vcs.run(
                &[
                    "-c",
                    "protocol.file.allow=always",
                    "submodule",
                    "add",
                    "--force",
                    &nested_ref.url,
                    &full_path,
                ],
                &mono_root,
                false,
            )?;

            let nested_dir = mono_root.join(&full_path);
            // Tolerated condition:
            // fall back to whatever the clone now points at if the recorded
            // commit can't be checked out, and report the observed hash.
            let checkout =
                self.vcs
                    .run(&["checkout", nested_ref.commit.as_str()], &nested_dir, true)?;
            let observed_commit = if checkout.success() {
                nested_ref.commit.clone()
            } else {
                log::warn!(
                    "{}",
                    crate::log::scoped_message(format_args!(
                        "could not pin nested submodule {full_path} to {}: falling back to observed HEAD",
                        nested_ref.commit
                    ))
                );
                RepoProbe::new(self.vcs).head_commit(&nested_dir)?
            };

            self.vcs.run(&["add", &full_path], &mono_root, false)?;
            let message = format!(
                "{} register nested submodule {full_path} @ {observed_commit}",
                self.bookkeeping_marker
            );
            self.vcs.run(&["commit", "-m", &message], &mono_root, false)?;

            // Integrity check: the committed
            // tree entry must match the pinned commit.
            let ls_tree = self
                .vcs
                .run(&["ls-tree", "HEAD", "--", &full_path], &mono_root, false)?;
            let actual = parse_ls_tree_commit_hash(&ls_tree.stdout_str());
            if actual.as_deref() != Some(observed_commit.as_str()) {
                return Err(IntegrityError::NestedSubmodulePinMismatch {
                    path: full_path,
                    expected: observed_commit.to_string(),
                    actual: actual.unwrap_or_default(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Parses the first `<mode> commit <hash>\t<path>` line of `git ls-tree`
/// output, returning the commit hash of a gitlink entry.
fn parse_ls_tree_commit_hash(output: &str) -> Option<String> {
    let line = output.lines().next()?;
    let mut parts = line.split_whitespace();
    parts.next()?; // mode
    let kind = parts.next()?;
    if kind != "commit" {
        return None;
    }
    parts.next().map(str::to_owned)
}

fn sanitize_dir_name(path: &str) -> String {
    path.replace('/', "__")
}
