//! Executor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Tunables for one resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Optional cap on the nesting of `find_out` calls (default: none).
    ///
    /// Cycles are always detected; without a cap, nesting is bounded by the
    /// depth of the rule dependency graph.
    pub max_depth: Option<usize>,
    /// Reply meaning "I don't know" (default: `unknown`).
    pub no_answer_token: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_answer_token: "unknown".into(),
        }
    }
}

impl ExecutorConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read a TOML config file.
    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
