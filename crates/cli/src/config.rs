//! Configuration management for the CLI

use anyhow::{Context, Result};
use knodes_lib::SortKey;
use serde::Deserialize;
use std::path::PathBuf;

/// CLI configuration
///
/// Layered from `~/.config/knodes/config.json` and `KNODES_*` environment
/// variables. Command-line flags take precedence over both.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Sort key used when `--sort` is not given
    pub default_sort: Option<String>,
    /// Kubeconfig context used when `--context` is not given
    pub context: Option<String>,
    /// Fixed report width, for output that is not a terminal
    pub width: Option<u16>,
}

impl Config {
    /// Load configuration from the user config file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific file (which may be absent) and environment
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("KNODES").try_parsing(true))
            .build()
            .context("Failed to load configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Configured sort key; invalid values are ignored with a warning
    pub fn sort_key(&self) -> Option<SortKey> {
        let raw = self.default_sort.as_deref()?;
        match raw.parse() {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(value = %raw, error = %err, "Ignoring invalid default_sort");
                None
            }
        }
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("knodes").join("config.json"))
    }
}
