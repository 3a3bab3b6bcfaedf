// Configuration for the commitlog CLI
//
// Resolution order: --config flag, COMMITLOG_CONFIG env var, ./commitlog.toml.
// A missing file means defaults; a present but invalid file is an error.

use anyhow::{Context, Result};
use commitlog_core::SyncPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "COMMITLOG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "commitlog.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default log file when --fname is not given
    pub log_file: Option<PathBuf>,
    /// Default writer identity when --cid is not given
    pub writer_id: Option<String>,
    /// tracing filter used when RUST_LOG is unset
    pub log_filter: String,
    pub sync: SyncPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_file: None,
            writer_id: None,
            log_filter: "warn".to_string(),
            sync: SyncPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }
}

/// Load configuration, falling back to defaults when no file is found
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load_from(path);
    }

    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

    if config_path.exists() {
        Config::load_from(&config_path)
    } else {
        Ok(Config::default())
    }
}
