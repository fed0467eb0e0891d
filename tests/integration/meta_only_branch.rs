use git_monomerge_testtools::test_util::{cargo_bin_git_monomerge_for_testing, git_command_for_testing};

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn lib_a_present_on_main_absent_on_feature() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::meta_only_branch_without_tracking(&ws);
    let mono = ws.mono_path();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .success();

    git_command_for_testing(&mono)
        .args(["checkout", "main"])
        .assert()
        .success();
    assert!(mono.join("libA").is_dir());

    git_command_for_testing(&mono)
        .args(["checkout", "feature"])
        .assert()
        .success();
    assert!(!mono.join("libA").exists());
}
