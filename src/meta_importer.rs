//! C4 — Meta importer.

use std::collections::BTreeSet;
use std::path::Path;

use crate::probe::RepoProbe;
use crate::types::MetaBranchCommits;
use crate::vcs::VcsAdapter;

const META_REMOTE_NAME: &str = "monomerge-meta-import";

pub struct MetaImporter<'a> {
    vcs: &'a VcsAdapter,
    bookkeeping_marker: &'a str,
}

impl<'a> MetaImporter<'a> {
    pub fn new(vcs: &'a VcsAdapter, bookkeeping_marker: &'a str) -> Self {
        Self {
            vcs,
            bookkeeping_marker,
        }
    }

    /// For each surviving meta branch (the default branch always survives
    /// even if whitelisted out), create or reset a same-named mono branch to
    /// the meta-branch tip, then append one bookkeeping anchor commit,
    /// recording the pre-bookkeeping tip in the returned
    /// [`MetaBranchCommits`].
    pub fn import(
        &self,
        mono_root: &Path,
        meta_root: &Path,
        meta_default_branch: &str,
        whitelist: Option<&[String]>,
    ) -> anyhow::Result<MetaBranchCommits> {
        let probe = RepoProbe::new(self.vcs);
        let all_branches = probe.list_branches(meta_root)?;

        let surviving: BTreeSet<String> = match whitelist {
            None => all_branches.into_iter().collect(),
            Some(allowed) => {
                let allowed: BTreeSet<&str> = allowed.iter().map(String::as_str).collect();
                all_branches
                    .into_iter()
                    .filter(|b| b == meta_default_branch || allowed.contains(b.as_str()))
                    .collect()
            }
        };

        let mut commits = MetaBranchCommits::default();
        for branch in &surviving {
            let _scope = crate::log::scope(format!("meta:{branch}"));
            self.import_one_branch(mono_root, meta_root, branch, &mut commits)?;
        }
        Ok(commits)
    }

    fn import_one_branch(
        &self,
        mono_root: &Path,
        meta_root: &Path,
        branch: &str,
        commits: &mut MetaBranchCommits,
    ) -> anyhow::Result<()> {
        let meta_url = meta_root.to_string_lossy().into_owned();
        self.vcs
            .run(&["remote", "add", META_REMOTE_NAME, &meta_url], mono_root, false)?;
        let fetch_result = self.vcs.run(
            &[
                "fetch",
                META_REMOTE_NAME,
                &format!("{branch}:refs/monomerge-fetch/{branch}"),
            ],
            mono_root,
            true,
        );
        // Always remove the transient remote, even if the fetch failed, so a
        // later retry does not trip over "remote already exists".
        self.vcs
            .run(&["remote", "remove", META_REMOTE_NAME], mono_root, true)?;
        fetch_result?.success().then_some(()).ok_or_else(|| {
            anyhow::anyhow!("failed to fetch meta branch {branch} from {}", meta_root.display())
        })?;

        self.vcs.run(
            &[
                "checkout",
                "-B",
                branch,
                &format!("refs/monomerge-fetch/{branch}"),
            ],
            mono_root,
            false,
        )?;
        self.vcs
            .run(&["update-ref", "-d", &format!("refs/monomerge-fetch/{branch}")], mono_root, true)?;

        let probe = RepoProbe::new(self.vcs);
        let pre_bookkeeping_commit = probe.head_commit(mono_root)?;

        let message = format!(
            "{} import meta branch {branch}@{pre_bookkeeping_commit}",
            self.bookkeeping_marker
        );
        self.vcs
            .run(&["commit", "--allow-empty", "-m", &message], mono_root, false)?;

        commits.insert(branch.to_owned(), pre_bookkeeping_commit);
        Ok(())
    }
}
