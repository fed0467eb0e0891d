use git_monomerge_testtools::test_util::{cargo_bin_git_monomerge_for_testing, git_command_for_testing};

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn foo_branch_pulls_lib_a_from_its_default_branch() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::case3_substituted_default(&ws);
    let mono = ws.mono_path();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .assert()
        .success();

    git_command_for_testing(&mono)
        .args(["checkout", "foo"])
        .assert()
        .success();
    let content = std::fs::read_to_string(mono.join("libA").join("lib.txt")).unwrap();
    assert_eq!(content, "libA content\n");
    assert!(mono.join("NOTES.md").exists());
}
