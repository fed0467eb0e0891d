//! Strategy file and branch-whitelist configuration.
//!
//! Follows this lineage's own configuration idiom: `#[serde(default = "fn")]`
//! per optional field so a hand-edited, partially specified file still
//! deserializes, and `serde_path_to_error` so a malformed file reports the
//! exact JSON pointer of the offending field.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::types::SubmoduleReference;

fn consume_branches_default() -> bool {
    true
}

/// One operator-approved submodule entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyEntry {
    pub url: String,
    #[serde(default = "consume_branches_default")]
    pub consume_branches: bool,
}

/// `submodulePath → {url, consumeBranches}`.
pub type Strategy = BTreeMap<String, StrategyEntry>;

/// Builds the `--dump-template` payload: every discovered submodule maps to
/// `{url, consumeBranches: true}`.
pub fn dump_template(submodules: &[SubmoduleReference]) -> Strategy {
    submodules
        .iter()
        .map(|s| {
            (
                s.path.clone(),
                StrategyEntry {
                    url: s.url.clone(),
                    consume_branches: true,
                },
            )
        })
        .collect()
}

pub fn load_strategy(path: &Path) -> anyhow::Result<Strategy> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigurationError::MalformedStrategy {
            path: path.to_owned(),
            source: source.into(),
        })?;
    let deserializer = &mut serde_json::Deserializer::from_str(&content);
    serde_path_to_error::deserialize(deserializer).map_err(|source| {
        ConfigurationError::MalformedStrategy {
            path: path.to_owned(),
            source: source.into(),
        }
        .into()
    })
}

/// Decides whether a discovered submodule should be imported, per the
/// strategy-file interplay rule: no entry ⇒ import; an
/// entry whose `url` disagrees with the discovered URL ⇒ skip regardless of
/// `consume_branches`; otherwise follow `consume_branches`.
pub fn should_import(strategy: &Strategy, path: &str, discovered_url: &str) -> bool {
    match strategy.get(path) {
        None => true,
        Some(entry) => entry.url == discovered_url && entry.consume_branches,
    }
}

pub fn load_whitelist(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigurationError::MalformedWhitelist {
            path: path.to_owned(),
            source: source.into(),
        })?;
    let deserializer = &mut serde_json::Deserializer::from_str(&content);
    serde_path_to_error::deserialize(deserializer).map_err(|source| {
        ConfigurationError::MalformedWhitelist {
            path: path.to_owned(),
            source: source.into(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_branches_defaults_to_true_when_omitted() {
        let json = r#"{"libA": {"url": "https://example.com/a.git"}}"#;
        let strategy: Strategy = serde_json::from_str(json).unwrap();
        assert!(strategy["libA"].consume_branches);
    }

    #[test]
    fn no_entry_means_import() {
        let strategy = Strategy::new();
        assert!(should_import(&strategy, "libA", "https://example.com/a.git"));
    }

    #[test]
    fn mismatched_url_skips_regardless_of_consume_branches() {
        let mut strategy = Strategy::new();
        strategy.insert(
            "libA".to_owned(),
            StrategyEntry {
                url: "https://example.com/other.git".to_owned(),
                consume_branches: true,
            },
        );
        assert!(!should_import(&strategy, "libA", "https://example.com/a.git"));
    }

    #[test]
    fn consume_branches_false_skips() {
        let mut strategy = Strategy::new();
        strategy.insert(
            "libA".to_owned(),
            StrategyEntry {
                url: "https://example.com/a.git".to_owned(),
                consume_branches: false,
            },
        );
        assert!(!should_import(&strategy, "libA", "https://example.com/a.git"));
    }

    #[test]
    fn dump_template_maps_each_submodule() {
        let submodules = vec![SubmoduleReference::new(
            "libA",
            "https://example.com/a.git",
            "deadbeef".into(),
        )];
        let template = dump_template(&submodules);
        assert_eq!(template["libA"].url, "https://example.com/a.git");
        assert!(template["libA"].consume_branches);
    }
}
