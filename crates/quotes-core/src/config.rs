//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quotes/config.toml)
//! 3. Environment variables (QUOTES_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "QUOTES";

/// Placeholder API used when no sync URL is configured
pub const DEFAULT_SYNC_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote collection endpoint used for sync
    #[serde(default = "default_sync_url")]
    pub sync_url: String,

    /// Seconds between automatic syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Seconds before a sync request is abandoned
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,

    /// Number of remote items taken per sync
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Number of local quotes pushed per sync
    #[serde(default = "default_push_limit")]
    pub push_limit: usize,

    /// Whether sync pushes a sample of local quotes
    #[serde(default = "default_true")]
    pub push_enabled: bool,

    /// Category given to quotes fetched from the remote
    #[serde(default = "default_server_category")]
    pub server_category: String,

    /// Maximum bytes kept in the durable store (0 = unlimited)
    #[serde(default = "default_storage_quota")]
    pub storage_quota_bytes: u64,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sync_url: default_sync_url(),
            sync_interval_secs: default_sync_interval(),
            sync_timeout_secs: default_sync_timeout(),
            fetch_limit: default_fetch_limit(),
            push_limit: default_push_limit(),
            push_enabled: true,
            server_category: default_server_category(),
            storage_quota_bytes: default_storage_quota(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUOTES_DATA_DIR, QUOTES_SYNC_URL, ...)
    /// 2. Config file (~/.config/quotes/config.toml or QUOTES_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // QUOTES_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // QUOTES_SYNC_URL
        if let Ok(val) = std::env::var(format!("{}_SYNC_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.sync_url = val;
            }
        }

        // QUOTES_SYNC_INTERVAL
        if let Ok(val) = std::env::var(format!("{}_SYNC_INTERVAL", ENV_PREFIX)) {
            if let Ok(secs) = val.parse::<u64>() {
                if secs > 0 {
                    self.sync_interval_secs = secs;
                }
            }
        }

        // QUOTES_PUSH_ENABLED
        if let Ok(val) = std::env::var(format!("{}_PUSH_ENABLED", ENV_PREFIX)) {
            self.push_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUOTES_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quotes")
            .join("config.toml")
    }

    /// Directory holding the durable key-value store
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs.max(1))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotes")
}

fn default_sync_url() -> String {
    DEFAULT_SYNC_URL.to_string()
}

fn default_sync_interval() -> u64 {
    30
}

fn default_sync_timeout() -> u64 {
    10
}

fn default_fetch_limit() -> usize {
    10
}

fn default_push_limit() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_server_category() -> String {
    "Server".to_string()
}

fn default_storage_quota() -> u64 {
    5 * 1024 * 1024
}
