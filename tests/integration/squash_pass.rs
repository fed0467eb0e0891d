use predicates::prelude::*;

use git_monomerge_testtools::test_util::{cargo_bin_git_monomerge_for_testing, git_command_for_testing};

use crate::fixtures::monomerge::{self, Workspace};

const MARKER: &str = "[monomerge]";

#[test]
fn check_squashable_reports_the_marker_run() {
    let ws = Workspace::new();
    let mono = monomerge::squashable_branch_tip(&ws, MARKER);

    cargo_bin_git_monomerge_for_testing()
        .arg("check-squashable")
        .arg(&mono)
        .assert()
        .success()
        .stdout(predicate::str::contains("main: squashable"));
}

#[test]
fn squash_collapses_markers_and_preserves_order() {
    let ws = Workspace::new();
    let mono = monomerge::squashable_branch_tip(&ws, MARKER);

    cargo_bin_git_monomerge_for_testing()
        .arg("squash")
        .arg(&mono)
        .assert()
        .success()
        .stdout(predicate::str::contains("main: squashed"));

    let output = git_command_for_testing(&mono)
        .args(["log", "--first-parent", "--format=%s", "main"])
        .output()
        .unwrap();
    let subjects: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(subjects.len(), 3);
    assert!(subjects[0].starts_with(MARKER));
    assert_eq!(subjects[1], "second");
    assert_eq!(subjects[2], "initial");

    let body_output = git_command_for_testing(&mono)
        .args(["log", "-1", "--format=%B", "main"])
        .output()
        .unwrap();
    let body = String::from_utf8_lossy(&body_output.stdout);
    let one = body.find("bookkeeping one").expect("oldest subject present");
    let two = body.find("bookkeeping two").expect("middle subject present");
    let three = body.find("bookkeeping three").expect("newest subject present");
    assert!(one < two && two < three, "subjects must appear oldest to newest");
}
