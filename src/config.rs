//! Resolver configuration
//!
//! Loaded from a JSON file. Every field is optional; missing fields take
//! their defaults and unknown fields are rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{MultiRenamePolicy, SelectionOptions};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Naming of multi-column renames (default: numbered)
    #[serde(default)]
    pub multi_rename: MultiRenamePolicy,

    /// Log one line per evaluated term (default: false)
    #[serde(default)]
    pub log_resolutions: bool,

    /// Maximum terms accepted per request (default: 1024)
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

fn default_max_terms() -> usize {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multi_rename: MultiRenamePolicy::default(),
            log_resolutions: false,
            max_terms: default_max_terms(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else defaults
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_terms == 0 {
            return Err(ConfigError::Invalid("max_terms must be > 0".into()));
        }
        Ok(())
    }

    /// Selection options carrying this configuration's policies
    pub fn selection_options(&self) -> SelectionOptions {
        SelectionOptions::default().with_multi_rename(self.multi_rename)
    }
}
