//! Configuration management for projagg.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Command-line flags
//! 2. Environment variables (PROJAGG_*)
//! 3. Config file (PROJAGG_CONFIG or the platform config dir)
//! 4. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use projagg_core::engine::{DEFAULT_PASSES, ReconcileConfig};
use projagg_core::host::DEFAULT_DOTNET;
use projagg_core::retry::{DEFAULT_DELAY, DEFAULT_RETRIES, RetryPolicy};
use projagg_core::HostVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Automation host settings
    #[serde(default)]
    pub host: HostConfig,

    /// Add pass settings
    #[serde(default)]
    pub reconcile: ReconcileSettings,

    /// Retry settings for open/save/close
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host version selector (vs2013, vs2015)
    #[serde(default)]
    pub version: HostVersion,

    /// dotnet executable used to edit solutions
    #[serde(default = "default_dotnet")]
    pub dotnet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Maximum add passes per run
    #[serde(default = "default_passes")]
    pub passes: usize,

    /// Stop once a pass adds nothing
    #[serde(default)]
    pub stop_on_convergence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

// Default value functions
fn default_dotnet() -> String {
    DEFAULT_DOTNET.to_string()
}

fn default_passes() -> usize {
    DEFAULT_PASSES
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_delay_secs() -> u64 {
    DEFAULT_DELAY.as_secs()
}

fn default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "projagg", "projagg") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".projagg")
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: HostVersion::default(),
            dotnet: default_dotnet(),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            stop_on_convergence: false,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults.
    ///
    /// Environment variables override values from the file.
    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        let mut config = Self::read_file(config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(config_path: &std::path::Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            debug!("Loaded config from {:?}", config_path);
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            debug!("No config at {:?}, using defaults", config_path);
            Config::default()
        };

        Ok(config)
    }

    /// Apply `PROJAGG_*` overrides looked up through `var`.
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dotnet) = var("PROJAGG_DOTNET").filter(|v| !v.is_empty()) {
            debug!("PROJAGG_DOTNET overrides host.dotnet");
            self.host.dotnet = dotnet;
        }
    }

    /// Save configuration to file.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PROJAGG_CONFIG") {
            PathBuf::from(path)
        } else {
            default_config_dir().join("config.toml")
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.retries, Duration::from_secs(self.retry.delay_secs))
    }

    /// Engine settings for a run against the given host version.
    pub fn reconcile_config(&self, host_version: HostVersion) -> ReconcileConfig {
        ReconcileConfig {
            host_version,
            passes: self.reconcile.passes,
            stop_on_convergence: self.reconcile.stop_on_convergence,
            retry: self.retry_policy(),
        }
    }
}
