//! C8 — Orchestrator: workspace preparation, strategy
//! template load/dump, whitelist filtering, and the C4→C5→C6→C7 sequence.
//!
//! This is the only component that owns the mono repository's location and
//! the [`MonorepoCache`]; every other component borrows them for the
//! duration of a call.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::MonorepoCache;
use crate::error::ConfigurationError;
use crate::meta_importer::MetaImporter;
use crate::probe::RepoProbe;
use crate::report::MigrationReport;
use crate::rewrite_tool::{self, HistoryRewriter};
use crate::squash::{self};
use crate::strategy::{self, Strategy};
use crate::submodule_importer::SubmoduleImporter;
use crate::types::{CommitRange, MigrationImportInfo, SubmoduleImportInfo, SubmoduleReference};
use crate::vcs::VcsAdapter;
use crate::workspace::Sandbox;

/// Bootstrap files tolerated in an existing, otherwise-empty mono directory.
const MONO_BOOTSTRAP_ALLOWLIST: &[&str] = &["README", "README.md", ".gitignore", ".gitattributes"];

const DEFAULT_MONO_BRANCH: &str = "main";

/// Inputs to a single orchestrator run.
pub struct RunRequest {
    pub meta_location: String,
    pub mono_root: PathBuf,
    pub strategy_path: Option<PathBuf>,
    pub whitelist_path: Option<PathBuf>,
    pub dump_template_path: Option<PathBuf>,
    pub report_json_path: PathBuf,
    pub report_text_path: PathBuf,
    pub check_squashable: bool,
    pub squash: bool,
}

/// What a run actually did, for the CLI to report and pick an exit code from.
pub struct RunOutcome {
    pub dumped_template: bool,
    pub report: Option<MigrationReport>,
    pub squashable_branches: BTreeMap<String, Option<CommitRange>>,
}

impl RunOutcome {
    /// Whether `--check-squashable` found every branch squashable.
    pub fn all_squashable(&self) -> bool {
        self.squashable_branches.values().all(Option::is_some)
    }
}

/// Read-only discovery of every submodule referenced anywhere in the meta
/// repository, used both by `--dump-template` and by a full run.
pub struct SubmoduleDiscovery {
    pub default_branch: String,
    pub submodules: Vec<SubmoduleReference>,
    pub per_branch: BTreeMap<String, Vec<SubmoduleReference>>,
}

pub struct Orchestrator<'a> {
    vcs: &'a VcsAdapter,
    rewriter: &'a dyn HistoryRewriter,
    bookkeeping_marker: &'a str,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        vcs: &'a VcsAdapter,
        rewriter: &'a dyn HistoryRewriter,
        bookkeeping_marker: &'a str,
    ) -> Self {
        Self {
            vcs,
            rewriter,
            bookkeeping_marker,
        }
    }

    /// Clones the meta repository into the sandbox and materializes a local
    /// branch for every remote branch.
    fn clone_meta(&self, sandbox: &Sandbox, meta_location: &str) -> anyhow::Result<PathBuf> {
        let meta_root = sandbox.child("meta");
        self.vcs
            .run(&["clone", meta_location, &meta_root.to_string_lossy()], sandbox.path(), false)
            .with_context(|| format!("failed to clone meta repository {meta_location}"))?;

        let probe = RepoProbe::new(self.vcs);
        let default_branch = probe.head_branch(&meta_root)?.ok_or_else(|| {
            ConfigurationError::IndeterminateDefaultBranch {
                repo: meta_location.to_owned(),
            }
        })?;
        for branch in probe.list_branches(&meta_root)? {
            if branch == default_branch {
                continue;
            }
            self.vcs
                .run(&["branch", "--track", &branch, &format!("origin/{branch}")], &meta_root, true)?;
        }
        Ok(meta_root)
    }

    /// Prepares the mono repository: validates an existing directory is
    /// empty but for bootstrap files, or initializes a
    /// fresh one with default branch `main`.
    fn prepare_mono(&self, mono_root: &Path) -> anyhow::Result<()> {
        if mono_root.join(".git").exists() {
            return Ok(());
        }
        if mono_root.exists() {
            let mut entries = std::fs::read_dir(mono_root)?;
            let non_bootstrap = entries.any(|entry| {
                let entry = entry.expect("readable directory entry");
                let name = entry.file_name();
                !MONO_BOOTSTRAP_ALLOWLIST
                    .iter()
                    .any(|allowed| name == std::ffi::OsStr::new(allowed))
            });
            if non_bootstrap {
                return Err(ConfigurationError::NonEmptyMonoDirectory {
                    path: mono_root.to_owned(),
                }
                .into());
            }
        } else {
            std::fs::create_dir_all(mono_root)?;
        }
        self.vcs.run(
            &["init", "--initial-branch", DEFAULT_MONO_BRANCH],
            mono_root,
            false,
        )?;
        Ok(())
    }

    /// Enumerates every submodule referenced by any branch of the meta
    /// repository. `meta_location` is the URL or
    /// path the meta repository was cloned from, used to resolve relative
    /// submodule URLs.
    pub fn discover_submodules(
        &self,
        meta_root: &Path,
        meta_location: &str,
        whitelist: Option<&[String]>,
    ) -> anyhow::Result<SubmoduleDiscovery> {
        let probe = RepoProbe::new(self.vcs);
        let default_branch = probe.head_branch(meta_root)?.ok_or_else(|| {
            ConfigurationError::IndeterminateDefaultBranch {
                repo: meta_root.display().to_string(),
            }
        })?;
        let all_branches = probe.list_branches(meta_root)?;
        let surviving: Vec<String> = match whitelist {
            None => all_branches,
            Some(allowed) => {
                let allowed: BTreeSet<&str> = allowed.iter().map(String::as_str).collect();
                all_branches
                    .into_iter()
                    .filter(|b| b == &default_branch || allowed.contains(b.as_str()))
                    .collect()
            }
        };

        let mut per_branch = BTreeMap::new();
        let mut by_identity: BTreeMap<(String, String), SubmoduleReference> = BTreeMap::new();
        for branch in &surviving {
            self.vcs
                .run(&["checkout", branch], meta_root, false)?;
            let submodules = probe.list_submodules(meta_root, Some(meta_location))?;
            for submodule in &submodules {
                by_identity
                    .entry((submodule.path.clone(), submodule.url.clone()))
                    .or_insert_with(|| submodule.clone());
            }
            per_branch.insert(branch.clone(), submodules);
        }
        self.vcs.run(&["checkout", &default_branch], meta_root, true)?;

        Ok(SubmoduleDiscovery {
            default_branch,
            submodules: by_identity.into_values().collect(),
            per_branch,
        })
    }

    /// Clones the meta repository, discovers its submodules, and builds a
    /// strategy template, without touching a mono repository.
    pub fn dump_template(
        &self,
        meta_location: &str,
        whitelist: Option<&[String]>,
    ) -> anyhow::Result<Strategy> {
        let sandbox = Sandbox::new()?;
        let meta_root = self.clone_meta(&sandbox, meta_location)?;
        let discovery = self.discover_submodules(&meta_root, meta_location, whitelist)?;
        Ok(strategy::dump_template(&discovery.submodules))
    }

    /// Clones the meta repository and runs discovery only, for the
    /// `report-branches` subcommand.
    pub fn report_branches(
        &self,
        meta_location: &str,
        whitelist: Option<&[String]>,
    ) -> anyhow::Result<SubmoduleDiscovery> {
        let sandbox = Sandbox::new()?;
        let meta_root = self.clone_meta(&sandbox, meta_location)?;
        self.discover_submodules(&meta_root, meta_location, whitelist)
    }

    /// Runs the full migration.
    pub fn run(&self, request: &RunRequest) -> anyhow::Result<RunOutcome> {
        let rewriter_binary = self.rewriter.binary_name();
        if !rewrite_tool::binary_is_available(rewriter_binary) {
            return Err(ConfigurationError::MissingHistoryRewriter {
                binary: rewriter_binary.to_owned(),
            }
            .into());
        }

        let sandbox = Sandbox::new()?;
        let meta_root = self.clone_meta(&sandbox, &request.meta_location)?;
        let probe = RepoProbe::new(self.vcs);
        let meta_default_branch = probe.head_branch(&meta_root)?.ok_or_else(|| {
            ConfigurationError::IndeterminateDefaultBranch {
                repo: request.meta_location.clone(),
            }
        })?;

        let whitelist = request
            .whitelist_path
            .as_deref()
            .map(strategy::load_whitelist)
            .transpose()?;

        let discovery =
            self.discover_submodules(&meta_root, &request.meta_location, whitelist.as_deref())?;

        if let Some(template_path) = &request.dump_template_path {
            let template = strategy::dump_template(&discovery.submodules);
            std::fs::write(template_path, serde_json::to_string_pretty(&template)?)?;
            return Ok(RunOutcome {
                dumped_template: true,
                report: None,
                squashable_branches: BTreeMap::new(),
            });
        }

        let strategy: Strategy = request
            .strategy_path
            .as_deref()
            .map(strategy::load_strategy)
            .transpose()?
            .unwrap_or_default();

        self.prepare_mono(&request.mono_root)?;

        let meta_importer = MetaImporter::new(self.vcs, self.bookkeeping_marker);
        let meta_branch_commits = meta_importer.import(
            &request.mono_root,
            &meta_root,
            &meta_default_branch,
            whitelist.as_deref(),
        )?;

        let mut cache = MonorepoCache::with_meta_base_url(
            self.vcs,
            request.mono_root.clone(),
            Some(request.meta_location.clone()),
        );
        let submodule_importer =
            SubmoduleImporter::new(self.vcs, self.rewriter, self.bookkeeping_marker, &sandbox);

        // Deterministic iteration order by submodule path: earlier submodules are fully committed,
        // including nested registrations, before later ones begin.
        let mut ordered_submodules = discovery.submodules.clone();
        ordered_submodules.sort_by(|a, b| a.path.cmp(&b.path));

        // Long-running, multi-step CLI operation: one progress tick per
        // submodule in the closure, whether imported or skipped.
        let progress = indicatif::ProgressBar::new(ordered_submodules.len() as u64);
        progress.set_style(
            indicatif::ProgressStyle::with_template(
                "{wide_bar} {pos}/{len} submodules: {msg}",
            )
            .expect("valid template"),
        );

        let mut submodule_infos: BTreeMap<String, SubmoduleImportInfo> = BTreeMap::new();
        for submodule in &ordered_submodules {
            progress.set_message(submodule.path.clone());
            if !strategy::should_import(&strategy, &submodule.path, &submodule.url) {
                log::info!(
                    "{}",
                    crate::log::scoped_message(format_args!(
                        "skipping submodule {} per strategy",
                        submodule.path
                    ))
                );
                progress.inc(1);
                continue;
            }
            let info = submodule_importer.import(
                &mut cache,
                submodule,
                &meta_default_branch,
                &meta_branch_commits,
                whitelist.as_deref(),
            )?;
            submodule_infos.insert(submodule.path.clone(), info);
            progress.inc(1);
        }

        let import_info = MigrationImportInfo {
            meta_default_branch: meta_default_branch.clone(),
            meta_name: request.meta_location.clone(),
            mono_name: request.mono_root.display().to_string(),
            submodules: submodule_infos,
        };
        let report = MigrationReport::build(&import_info);

        std::fs::write(&request.report_json_path, report.to_json()?)?;
        std::fs::write(&request.report_text_path, report.to_text())?;

        let squashable_branches = if request.check_squashable || request.squash {
            self.run_squash_pass(&request.mono_root, request.squash)?
        } else {
            BTreeMap::new()
        };

        Ok(RunOutcome {
            dumped_template: false,
            report: Some(report),
            squashable_branches,
        })
    }

    /// Runs the squash pass against every branch of an
    /// already-migrated mono repository. Shared by a full run's
    /// `--check-squashable`/`--squash` flags and the standalone
    /// `check-squashable`/`squash` subcommands, which operate on a mono
    /// repository directly without cloning a meta.
    pub fn run_squash_pass(
        &self,
        mono_root: &Path,
        perform_squash: bool,
    ) -> anyhow::Result<BTreeMap<String, Option<CommitRange>>> {
        let probe = RepoProbe::new(self.vcs);
        let mono_branches = probe.list_branches(mono_root)?;
        let mut squashable_branches = BTreeMap::new();
        for branch in &mono_branches {
            let range =
                squash::check_squashable(self.vcs, mono_root, branch, self.bookkeeping_marker)?;
            if perform_squash {
                if let Some(range) = &range {
                    self.vcs.run(&["checkout", branch], mono_root, false)?;
                    let title = format!(
                        "{} squash bookkeeping for {branch}",
                        self.bookkeeping_marker
                    );
                    let description = format!(
                        "Collapses the bookkeeping commits produced while importing {branch}."
                    );
                    squash::squash_commits(self.vcs, mono_root, range, &title, &description)?;
                }
            }
            squashable_branches.insert(branch.clone(), range);
        }
        Ok(squashable_branches)
    }
}
