use git_monomerge_testtools::test_util::{cargo_bin_git_monomerge_for_testing, git_command_for_testing};

use crate::fixtures::monomerge::{self, Workspace};

fn nested_commit_hash(mono: &std::path::Path, branch: &str) -> String {
    git_command_for_testing(mono)
        .args(["checkout", branch])
        .assert()
        .success();
    let output = git_command_for_testing(mono)
        .args(["ls-tree", "HEAD", "--", "libA/libN"])
        .output()
        .unwrap();
    let line = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    line.split_whitespace()
        .nth(2)
        .expect("gitlink entry")
        .to_owned()
}

#[test]
fn each_branch_registers_its_own_nested_commit() {
    let ws = Workspace::new();
    let (meta, _lib_a, lib_n) = monomerge::divergent_nested_submodule(&ws);
    let mono = ws.mono_path();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .success();

    let main_hash = nested_commit_hash(&mono, "main");
    let bar_hash = nested_commit_hash(&mono, "bar");
    assert_ne!(main_hash, bar_hash);

    git_command_for_testing(&lib_n)
        .args(["checkout", "main"])
        .assert()
        .success();
    let expected_main = git_command_for_testing(&lib_n)
        .args(["rev-parse", "HEAD"])
        .output()
        .unwrap();
    assert_eq!(
        main_hash,
        String::from_utf8_lossy(&expected_main.stdout).trim()
    );

    git_command_for_testing(&lib_n)
        .args(["checkout", "bar"])
        .assert()
        .success();
    let expected_bar = git_command_for_testing(&lib_n)
        .args(["rev-parse", "HEAD"])
        .output()
        .unwrap();
    assert_eq!(
        bar_hash,
        String::from_utf8_lossy(&expected_bar.stdout).trim()
    );
}
