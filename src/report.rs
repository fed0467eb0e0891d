//! C6 — Report aggregator.
//!
//! Two-pass transformation over [`MigrationImportInfo`], grounded directly
//! on the two-pass `MigrationReport` construction in the system this tool
//! replaces: pass 1 folds in every entry belonging to the meta-default
//! branch (or substituting the submodule's own default branch for it);
//! pass 2 handles everything else, cloning the default branch's entry first
//! for newly created (Case-4) mono branches so they inherit every other
//! submodule's default bindings before being overridden for the submodule
//! that caused their creation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{CommitHash, MigrationImportInfo, SubmoduleImportEntry};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportedSubmoduleInfo {
    pub branch: String,
    pub commit: CommitHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackedNestedSubmodule {
    pub url: String,
    pub commit: CommitHash,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReportEntry {
    pub meta_branch: String,
    pub meta_commit: CommitHash,
    pub imported_submodules: BTreeMap<String, ImportedSubmoduleInfo>,
    pub tracked_nested_submodules: BTreeMap<String, TrackedNestedSubmodule>,
}

impl MigrationReportEntry {
    fn fresh(meta_branch: &str, meta_commit: &CommitHash) -> Self {
        Self {
            meta_branch: meta_branch.to_owned(),
            meta_commit: meta_commit.clone(),
            ..Default::default()
        }
    }

    fn merge_submodule(&mut self, submodule_path: &str, entry: &SubmoduleImportEntry) {
        self.imported_submodules.insert(
            submodule_path.to_owned(),
            ImportedSubmoduleInfo {
                branch: entry.sub_branch.clone(),
                commit: entry.sub_commit.clone(),
            },
        );
        for nested in &entry.nested {
            let full_path = format!("{submodule_path}/{}", nested.path);
            self.tracked_nested_submodules.insert(
                full_path,
                TrackedNestedSubmodule {
                    url: nested.url.clone(),
                    commit: nested.commit.clone(),
                },
            );
        }
    }
}

/// User-facing view, keyed by mono branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport(pub BTreeMap<String, MigrationReportEntry>);

impl MigrationReport {
    pub fn build(info: &MigrationImportInfo) -> Self {
        let meta_default = info.meta_default_branch.as_str();

        let mut all_entries: Vec<(&str, &SubmoduleImportEntry)> = Vec::new();
        for (path, sub_info) in &info.submodules {
            for entry in &sub_info.entries {
                all_entries.push((path.as_str(), entry));
            }
        }

        let mut report: BTreeMap<String, MigrationReportEntry> = BTreeMap::new();
        let mut remaining = Vec::new();

        // Pass 1.
        for (path, entry) in &all_entries {
            let default_branch = &info.submodules[*path].default_branch;
            let is_pass1 = entry.meta_branch == meta_default
                && (entry.sub_branch == meta_default || &entry.sub_branch == default_branch);
            if is_pass1 {
                let report_entry = report
                    .entry(entry.mono_branch.clone())
                    .or_insert_with(|| MigrationReportEntry::fresh(&entry.meta_branch, &entry.meta_commit));
                report_entry.merge_submodule(path, entry);
            } else {
                remaining.push((*path, *entry));
            }
        }

        // Pass 2.
        for (path, entry) in remaining {
            if entry.meta_branch == meta_default && !report.contains_key(&entry.mono_branch) {
                if let Some(default_entry) = report.get(meta_default).cloned() {
                    report.insert(entry.mono_branch.clone(), default_entry);
                }
            }
            let report_entry = report
                .entry(entry.mono_branch.clone())
                .or_insert_with(|| MigrationReportEntry::fresh(&entry.meta_branch, &entry.meta_commit));
            report_entry.merge_submodule(path, entry);
        }

        MigrationReport(report)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (mono_branch, entry) in &self.0 {
            out.push_str(&format!(
                "{mono_branch}: meta={}@{}\n",
                entry.meta_branch, entry.meta_commit
            ));
            for (path, info) in &entry.imported_submodules {
                out.push_str(&format!("  {path}: {}@{}\n", info.branch, info.commit));
            }
            for (path, nested) in &entry.tracked_nested_submodules {
                out.push_str(&format!(
                    "    nested {path}: {} @ {}\n",
                    nested.url, nested.commit
                ));
            }
        }
        out
    }
}
