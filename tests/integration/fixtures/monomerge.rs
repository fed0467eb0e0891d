//! Deterministic git-repository builders for the integration tests, one
//! function per literal migration scenario. Every commit goes through the
//! fixed author/committer environment
//! applied by [`git_command_for_testing`] so hashes are reproducible.

use std::path::{Path, PathBuf};

use git_monomerge_testtools::test_util::{git_command_for_testing, MaybePermanentTempDir};

pub struct Workspace {
    root: MaybePermanentTempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: MaybePermanentTempDir::create(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn mono_path(&self) -> PathBuf {
        self.path("mono")
    }
}

pub fn init_repo(path: &Path, default_branch: &str) {
    std::fs::create_dir_all(path).unwrap();
    git_command_for_testing(path)
        .args(["init", "--initial-branch", default_branch])
        .assert()
        .success();
}

pub fn write_file(repo: &Path, name: &str, contents: &str) {
    std::fs::write(repo.join(name), contents).unwrap();
}

pub fn commit_all(repo: &Path, message: &str) {
    git_command_for_testing(repo)
        .args(["add", "-A"])
        .assert()
        .success();
    git_command_for_testing(repo)
        .args(["commit", "--allow-empty", "-m", message])
        .assert()
        .success();
}

pub fn checkout_new_branch(repo: &Path, name: &str) {
    git_command_for_testing(repo)
        .args(["checkout", "-b", name])
        .assert()
        .success();
}

pub fn checkout(repo: &Path, name: &str) {
    git_command_for_testing(repo)
        .args(["checkout", name])
        .assert()
        .success();
}

pub fn add_submodule(repo: &Path, path: &str, url: &Path) {
    git_command_for_testing(repo)
        .args(["-c", "protocol.file.allow=always"])
        .args(["submodule", "add", "--force", &url.to_string_lossy(), path])
        .assert()
        .success();
    commit_all(repo, &format!("add {path} submodule"));
}

/// Scenario 1: meta has `main, feature`; `feature` does not track `libA`
/// (tracked only on `main`).
pub fn meta_only_branch_without_tracking(ws: &Workspace) -> (PathBuf, PathBuf) {
    let lib_a = ws.path("libA");
    init_repo(&lib_a, "main");
    write_file(&lib_a, "lib.txt", "libA content\n");
    commit_all(&lib_a, "libA: initial");

    let meta = ws.path("meta");
    init_repo(&meta, "main");
    write_file(&meta, "README.md", "meta\n");
    commit_all(&meta, "meta: initial");
    add_submodule(&meta, "libA", &lib_a);

    checkout_new_branch(&meta, "feature");
    git_command_for_testing(&meta)
        .args(["rm", "-rf", "libA"])
        .assert()
        .success();
    commit_all(&meta, "meta: feature drops libA");
    checkout(&meta, "main");

    (meta, lib_a)
}

/// Scenario 2 (Case 4): meta has `main`; `libA` has `main, exp`; `main`
/// tracks `libA`.
pub fn case4_submodule_only_branch(ws: &Workspace) -> (PathBuf, PathBuf) {
    let lib_a = ws.path("libA");
    init_repo(&lib_a, "main");
    write_file(&lib_a, "lib.txt", "libA main\n");
    commit_all(&lib_a, "libA: initial");
    checkout_new_branch(&lib_a, "exp");
    write_file(&lib_a, "lib.txt", "libA exp\n");
    commit_all(&lib_a, "libA: exp change");
    checkout(&lib_a, "main");

    let meta = ws.path("meta");
    init_repo(&meta, "main");
    write_file(&meta, "README.md", "meta\n");
    commit_all(&meta, "meta: initial");
    add_submodule(&meta, "libA", &lib_a);

    (meta, lib_a)
}

/// Scenario 3 (Case 3): meta has `main, foo` both tracking `libA`; `libA`
/// has `main` only.
pub fn case3_substituted_default(ws: &Workspace) -> (PathBuf, PathBuf) {
    let lib_a = ws.path("libA");
    init_repo(&lib_a, "main");
    write_file(&lib_a, "lib.txt", "libA content\n");
    commit_all(&lib_a, "libA: initial");

    let meta = ws.path("meta");
    init_repo(&meta, "main");
    write_file(&meta, "README.md", "meta\n");
    commit_all(&meta, "meta: initial");
    add_submodule(&meta, "libA", &lib_a);

    checkout_new_branch(&meta, "foo");
    write_file(&meta, "NOTES.md", "foo notes\n");
    commit_all(&meta, "meta: foo notes");
    checkout(&meta, "main");

    (meta, lib_a)
}

/// Scenario 4: `libA@main` pins `libN@main`; `libA@bar` pins `libN@bar`.
/// Meta has `main, bar`, both same-named branches of `libA`.
pub fn divergent_nested_submodule(ws: &Workspace) -> (PathBuf, PathBuf, PathBuf) {
    let lib_n = ws.path("libN");
    init_repo(&lib_n, "main");
    write_file(&lib_n, "n.txt", "libN main\n");
    commit_all(&lib_n, "libN: initial");
    checkout_new_branch(&lib_n, "bar");
    write_file(&lib_n, "n.txt", "libN bar\n");
    commit_all(&lib_n, "libN: bar change");
    checkout(&lib_n, "main");

    let lib_a = ws.path("libA");
    init_repo(&lib_a, "main");
    write_file(&lib_a, "a.txt", "libA main\n");
    commit_all(&lib_a, "libA: initial");
    add_submodule(&lib_a, "libN", &lib_n);

    checkout_new_branch(&lib_a, "bar");
    let lib_n_in_lib_a = lib_a.join("libN");
    git_command_for_testing(&lib_n_in_lib_a)
        .args(["checkout", "-b", "bar", "origin/bar"])
        .assert()
        .success();
    git_command_for_testing(&lib_a)
        .args(["add", "libN"])
        .assert()
        .success();
    commit_all(&lib_a, "libA: bar pins libN@bar");
    checkout(&lib_a, "main");

    let meta = ws.path("meta");
    init_repo(&meta, "main");
    write_file(&meta, "README.md", "meta\n");
    commit_all(&meta, "meta: initial");
    add_submodule(&meta, "libA", &lib_a);

    checkout_new_branch(&meta, "bar");
    let lib_a_in_meta = meta.join("libA");
    git_command_for_testing(&lib_a_in_meta)
        .args(["checkout", "-b", "bar", "origin/bar"])
        .assert()
        .success();
    git_command_for_testing(&meta)
        .args(["add", "libA"])
        .assert()
        .success();
    commit_all(&meta, "meta: bar pins libA@bar");
    checkout(&meta, "main");

    (meta, lib_a, lib_n)
}

/// Scenario 5: a branch tip whose first-parent history, newest-to-oldest, is
/// `[marker, marker, marker, non-marker, non-marker]`.
pub fn squashable_branch_tip(ws: &Workspace, marker: &str) -> PathBuf {
    let mono = ws.mono_path();
    init_repo(&mono, "main");
    write_file(&mono, "a.txt", "one\n");
    commit_all(&mono, "initial");
    write_file(&mono, "a.txt", "two\n");
    commit_all(&mono, "second");
    commit_all(&mono, &format!("{marker} bookkeeping one"));
    commit_all(&mono, &format!("{marker} bookkeeping two"));
    commit_all(&mono, &format!("{marker} bookkeeping three"));
    mono
}
