use git_monomerge_testtools::test_util::cargo_bin_git_monomerge_for_testing;

use crate::fixtures::monomerge::{self, Workspace};

#[test]
fn writes_a_strategy_entry_for_every_discovered_submodule() {
    let ws = Workspace::new();
    let (meta, lib_a) = monomerge::case3_substituted_default(&ws);
    let output_path = ws.path("strategy.json");

    cargo_bin_git_monomerge_for_testing()
        .arg("dump-template")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&output_path).unwrap();
    let template: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        template["libA"]["url"].as_str().unwrap(),
        lib_a.to_string_lossy()
    );
    assert_eq!(template["libA"]["consume_branches"].as_bool(), Some(true));
}

#[test]
fn merge_dump_template_flag_exits_without_touching_mono() {
    let ws = Workspace::new();
    let (meta, _lib_a) = monomerge::case3_substituted_default(&ws);
    let output_path = ws.path("strategy.json");
    let mono = ws.mono_path();

    cargo_bin_git_monomerge_for_testing()
        .arg("merge")
        .arg(meta.to_string_lossy().into_owned())
        .arg("--mono")
        .arg(&mono)
        .arg("--dump-template")
        .arg(&output_path)
        .assert()
        .success();

    assert!(output_path.exists());
    assert!(!mono.exists());
}
