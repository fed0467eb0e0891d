//! Run-level configuration: binary overrides and the
//! bookkeeping marker, loadable from an optional TOML file and overridable
//! by CLI flags. Follows the `#[serde(default = "fn")]`-per-field idiom used
//! throughout this lineage's own configuration types.

use serde::{Deserialize, Serialize};

use crate::types::BOOKKEEPING_MARKER;

fn git_binary_default() -> String {
    "git".to_owned()
}

fn history_rewriter_binary_default() -> String {
    "git-filter-repo".to_owned()
}

fn bookkeeping_marker_default() -> String {
    BOOKKEEPING_MARKER.to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(default = "git_binary_default")]
    pub git_binary: String,
    #[serde(default = "history_rewriter_binary_default")]
    pub history_rewriter_binary: String,
    #[serde(default = "bookkeeping_marker_default")]
    pub bookkeeping_marker: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            git_binary: git_binary_default(),
            history_rewriter_binary: history_rewriter_binary_default(),
            bookkeeping_marker: bookkeeping_marker_default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let deserializer = toml::Deserializer::new(content);
        Ok(serde_path_to_error::deserialize(deserializer)?)
    }

    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_toml_str(&content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = RunConfig::default();
        assert_eq!(config.git_binary, "git");
        assert_eq!(config.history_rewriter_binary, "git-filter-repo");
        assert_eq!(config.bookkeeping_marker, BOOKKEEPING_MARKER);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = RunConfig::from_toml_str(r#"git_binary = "/opt/git/bin/git""#).unwrap();
        assert_eq!(config.git_binary, "/opt/git/bin/git");
        assert_eq!(config.history_rewriter_binary, "git-filter-repo");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
    }
}
