use predicates::prelude::*;

use git_monomerge_testtools::test_util::cargo_bin_git_monomerge_for_testing;

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn lists_every_branch_submodule_pair() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::case4_submodule_only_branch(&ws);

    cargo_bin_git_monomerge_for_testing()
        .arg("report-branches")
        .arg(meta.to_string_lossy().into_owned())
        .assert()
        .success()
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("libA"));
}
