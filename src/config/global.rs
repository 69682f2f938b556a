//! Global configuration management for get.
//!
//! This module handles the user configuration file (`~/.config/get/config.toml`).
//! Every field is optional; a missing file or a missing key falls back to the
//! defaults below.
//!
//! # Configuration File Location
//!
//! - **Default**: `~/.config/get/config.toml` (platform config directory)
//! - **Override**: set the `GET_CONFIG_PATH` environment variable
//!
//! # File Format
//!
//! ```toml
//! # Where installed packages and pending updates are tracked
//! metadata_path = "/home/me/.local/share/get/get.json"
//!
//! # Where standalone binaries are placed
//! bin_dir = "/usr/local/bin"
//!
//! # Timeout for the ranged request that sniffs asset types
//! sniff_timeout_secs = 15
//!
//! # Elevation helper: "sudo" for terminals, "pkexec" for graphical sessions
//! elevation = "sudo"
//!
//! github_api_url = "https://api.github.com"
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use get_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! println!("Binaries go to {}", config.bin_dir.display());
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_BIN_DIR, DEFAULT_GITHUB_API_URL, DEFAULT_SNIFF_TIMEOUT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// How privileged commands are elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
    /// `sudo -p <prompt>`, for terminal sessions.
    #[default]
    Sudo,
    /// `pkexec`, which shows a graphical password dialog.
    Pkexec,
}

impl Elevation {
    /// Name of the helper executable.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Pkexec => "pkexec",
        }
    }

    /// Arguments placed before the elevated command.
    ///
    /// `pkexec` has no prompt option; the prompt is shown by the frontend instead.
    #[must_use]
    pub fn prefix_args(self, prompt: &str) -> Vec<String> {
        match self {
            Self::Sudo => vec!["-p".to_string(), format!("{prompt}: ")],
            Self::Pkexec => Vec::new(),
        }
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Global configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Path of the JSON metadata file.
    pub metadata_path: PathBuf,

    /// Directory standalone binaries are installed into.
    pub bin_dir: PathBuf,

    /// Timeout in seconds for sniffing an asset's leading bytes.
    pub sniff_timeout_secs: u64,

    /// Elevation helper used for privileged commands.
    pub elevation: Elevation,

    /// GitHub API base URL. Tests point this at a local server.
    pub github_api_url: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            metadata_path: default_metadata_path(),
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            sniff_timeout_secs: DEFAULT_SNIFF_TIMEOUT.as_secs(),
            elevation: Elevation::default(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

/// `~/.local/share/get/get.json`, or a relative path if the data directory is unknown.
fn default_metadata_path() -> PathBuf {
    dirs::data_dir()
        .map_or_else(|| PathBuf::from(".get"), |dir| dir.join("get"))
        .join("get.json")
}

impl GlobalConfig {
    /// Load the configuration from `$GET_CONFIG_PATH` or the default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        Self::load_with_optional(Some(path)).await
    }

    /// Load from `path` if given and present, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(&path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save the configuration to a specific file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Default config file path (`~/.config/get/config.toml` on Linux).
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine config directory"))?;
        Ok(config_dir.join("get").join("config.toml"))
    }
}
