//! Shared configuration for dagpush tools
//!
//! Reads from ~/.dagpush/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default gateway used for existence checks
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io";

/// Top-level config structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Gateway (existence probe) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-attempt timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts per block (only timeouts are retried)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_retry_count() -> u32 {
    3
}

/// Upload pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Minimum spacing between probe launches
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    #[serde(default = "default_max_batch_actions")]
    pub max_batch_actions: usize,
    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: default_probe_interval_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
            max_batch_actions: default_max_batch_actions(),
            max_batch_bytes: default_max_batch_bytes(),
        }
    }
}

fn default_probe_interval_ms() -> u64 {
    20
}

fn default_max_concurrent_probes() -> usize {
    16
}

fn default_max_batch_actions() -> usize {
    7
}

fn default_max_batch_bytes() -> usize {
    262_144
}

impl Config {
    /// Load config from file, or create default if doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path())
    }

    /// Load config from a specific path, creating it with defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load config, returning default on any error (no panic)
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }
}

/// Get the dagpush directory (~/.dagpush)
pub fn get_dagpush_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DAGPUSH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dagpush")
}

/// Get the config file path (~/.dagpush/config.toml)
pub fn get_config_path() -> PathBuf {
    get_dagpush_dir().join("config.toml")
}
