//! Configuration for the update facade.
//!
//! The feed URL and verification key usually come from the host app's
//! packaging metadata; this TOML layer lets headless tools and tests supply
//! them without a bundle.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdaterError};

/// Default interval between scheduled background checks.
pub const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 24;

/// Update checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Appcast feed URL.
    pub feed_url: String,
    /// Public key used by the checker to authenticate the feed.
    pub verification_key: String,
    /// Initial automatic-check setting, used until the user picks one.
    pub automatic_checks: bool,
    /// Minimum hours between background checks requested by the host.
    pub check_interval_hours: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            verification_key: String::new(),
            automatic_checks: true,
            check_interval_hours: DEFAULT_CHECK_INTERVAL_HOURS,
        }
    }
}

impl UpdaterConfig {
    /// Build a config for the given feed with default scheduling.
    pub fn new(feed_url: impl Into<String>, verification_key: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            verification_key: verification_key.into(),
            ..Self::default()
        }
    }

    /// Whether both feed fields are present.
    pub fn is_complete(&self) -> bool {
        !self.feed_url.trim().is_empty() && !self.verification_key.trim().is_empty()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| UpdaterError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| UpdaterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/fae/updater.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("fae-config"))
            .join("fae")
            .join("updater.toml")
    }
}
