use git_monomerge_testtools::test_util::{cargo_bin_git_monomerge_for_testing, git_command_for_testing};

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn exp_branch_is_created_with_lib_a_at_its_own_tip() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::case4_submodule_only_branch(&ws);
    let mono = ws.mono_path();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .success();

    let branches = git_command_for_testing(&mono)
        .args(["branch", "--list"])
        .output()
        .unwrap();
    let branches = String::from_utf8_lossy(&branches.stdout).to_owned();
    assert!(branches.contains("exp"));

    git_command_for_testing(&mono)
        .args(["checkout", "exp"])
        .assert()
        .success();
    let content = std::fs::read_to_string(mono.join("libA").join("lib.txt")).unwrap();
    assert_eq!(content, "libA exp\n");

    git_command_for_testing(&mono)
        .args(["checkout", "main"])
        .assert()
        .success();
    let content = std::fs::read_to_string(mono.join("libA").join("lib.txt")).unwrap();
    assert_eq!(content, "libA main\n");
}
