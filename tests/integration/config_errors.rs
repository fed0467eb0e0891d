use predicates::prelude::*;

use git_monomerge_testtools::test_util::cargo_bin_git_monomerge_for_testing;

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn non_empty_mono_directory_is_a_fatal_configuration_error() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::meta_only_branch_without_tracking(&ws);
    let mono = ws.mono_path();
    std::fs::create_dir_all(&mono).unwrap();
    std::fs::write(mono.join("unrelated.txt"), "pre-existing\n").unwrap();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not empty"));
}

#[test]
fn bootstrap_allowlisted_mono_directory_is_accepted() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::meta_only_branch_without_tracking(&ws);
    let mono = ws.mono_path();
    std::fs::create_dir_all(&mono).unwrap();
    std::fs::write(mono.join("README.md"), "placeholder\n").unwrap();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .success();
}
