//! Job configuration for the fileset agent.
//!
//! Mirrors the plugin option surface: a plain-text list file naming the
//! backup roots, plus optional allow/deny patterns. Loadable from a TOML
//! file with serde defaults.

use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Plain-text file listing backup roots, one path per line
    pub fileset: PathBuf,

    /// Regex that discovered files must match (absent = match everything)
    #[serde(default)]
    pub allow: Option<String>,

    /// Regex that excludes discovered files (absent = match nothing)
    #[serde(default)]
    pub deny: Option<String>,

    /// Log level for the driver binary (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl JobOptions {
    /// Options for one job over the given fileset list, no patterns.
    pub fn new(fileset: impl Into<PathBuf>) -> Self {
        Self {
            fileset: fileset.into(),
            allow: None,
            deny: None,
            log_level: default_log_level(),
        }
    }

    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("could not read {}: {e}", path.display()))
        })?;
        let options: JobOptions = toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Ok(options)
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::new("/etc/fileset-agent/fileset.list")
    }
}
