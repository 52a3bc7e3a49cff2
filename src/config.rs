//! Codec Configuration
//!
//! Policies for the open corners of the wire format. Loaded from a JSON
//! file; every field has a default so `{}` is a valid config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the encoder does with an operator outside the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownOperatorPolicy {
    /// Fail with `UnknownOperator`
    #[default]
    Reject,
    /// Emit the `UNKNOWN_OPERATOR` tag and log a warning
    Sentinel,
}

/// Child-count rules for `and`, `or` and `not`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundArityPolicy {
    /// `not` takes exactly one child, `and`/`or` at least one
    #[default]
    Strict,
    /// Any child count
    Unchecked,
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub unknown_operator_policy: UnknownOperatorPolicy,

    #[serde(default)]
    pub compound_arity_policy: CompoundArityPolicy,

    /// Maximum predicate nesting depth (default: 32)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    32
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unknown_operator_policy: UnknownOperatorPolicy::default(),
            compound_arity_policy: CompoundArityPolicy::default(),
            max_depth: default_max_depth(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl CodecConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a JSON config string
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
