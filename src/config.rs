//! Configuration management for downlink
//!
//! Handles config file loading/saving and credential lookup.
//! Config is stored at ~/.config/downlink/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.alldebrid.com/v4";
pub const DEFAULT_AGENT: &str = "downlink";

const TORRENT_POLL_SECS: u64 = 10;
const DELAYED_POLL_SECS: u64 = 5;

/// Immutable settings shared by every service call.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub agent: String,
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            agent: agent.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different service root (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// How long a session waits after one poll resolves before issuing the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub torrent: Duration,
    pub delayed: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            torrent: Duration::from_secs(TORRENT_POLL_SECS),
            delayed: Duration::from_secs(DELAYED_POLL_SECS),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution service API key
    pub api_key: Option<String>,
    /// Client-identifying agent string
    pub agent: Option<String>,
    /// Service root, e.g. https://api.alldebrid.com/v4
    pub base_url: Option<String>,
    pub torrent_poll_secs: Option<u64>,
    pub delayed_poll_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/downlink/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("downlink").join("config.toml"))
    }

    /// Load config from the default location, or defaults if absent
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply DOWNLINK_API_KEY / DOWNLINK_AGENT / DOWNLINK_BASE_URL
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("DOWNLINK_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(agent) = lookup("DOWNLINK_AGENT") {
            self.agent = Some(agent);
        }
        if let Some(url) = lookup("DOWNLINK_BASE_URL") {
            self.base_url = Some(url);
        }
        self
    }

    /// Freeze into the settings the service client needs
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No API key configured (set DOWNLINK_API_KEY or api_key in config.toml)")
            })?;

        let agent = self.agent.as_deref().unwrap_or(DEFAULT_AGENT);
        let mut config = ClientConfig::new(api_key, agent);
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }

    pub fn poll_intervals(&self) -> PollIntervals {
        let defaults = PollIntervals::default();
        PollIntervals {
            torrent: self
                .torrent_poll_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.torrent),
            delayed: self
                .delayed_poll_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delayed),
        }
    }
}
