//! Configuration loading
//!
//! Values come from the first file found in this order:
//! 1. an explicit path (must exist)
//! 2. `emailcss.toml` in the working directory
//! 3. `config.toml` in the per-user config directory
//!
//! and fall back to built-in defaults. Command-line flags are applied on top
//! by the binary.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{dirs, locator::DEFAULT_COMPILER};

/// File looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "emailcss.toml";
/// File looked up in the user config directory
pub const USER_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Compiler program name, or a path to it
    pub compiler: String,
    /// Ask the compiler for minified output
    pub compress: bool,
    /// Seconds to wait for one compiler run, 0 waits forever
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_owned(),
            compress: true,
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from `explicit` or the first default location present
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let user_file = dirs::user_config_dir().map(|dir| dir.join(USER_CONFIG_FILE));
        Self::load_from_candidates(
            std::iter::once(PathBuf::from(PROJECT_CONFIG_FILE)).chain(user_file),
        )
    }

    fn load_from_candidates(candidates: impl IntoIterator<Item = PathBuf>) -> Result<Self> {
        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Per-invocation timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
