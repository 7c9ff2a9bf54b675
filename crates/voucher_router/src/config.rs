//! Router configuration (TOML).
//!
//! Lookup order: explicit path, `VOUCHER_ROUTER_CONFIG`, the system path,
//! built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::context::DEFAULT_HISTORY_LIMIT;
use crate::fallback::FallbackConfig;
use crate::llm_client::LlmConfig;

pub const CONFIG_ENV: &str = "VOUCHER_ROUTER_CONFIG";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/voucher-router/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl RouterConfig {
    /// Resolve and load the configuration.
    ///
    /// An explicit path must exist. The env var and system paths fall back
    /// to defaults when the file is missing. A file that exists but does not
    /// parse is always an error.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load_from_path(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            if !env_path.trim().is_empty() {
                candidates.push(PathBuf::from(env_path));
            }
        }
        candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));

        for path in candidates {
            if path.exists() {
                let config = Self::load_from_path(&path)?;
                return Ok((config, ConfigSource::File(path)));
            }
            warn!("Config not found at {}, trying next location", path.display());
        }

        warn!("No config file found, using defaults");
        Ok((Self::default(), ConfigSource::Defaults))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}
