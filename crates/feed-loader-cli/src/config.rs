//! Configuration file support for feed-loader.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/feed-loader/config.toml` (lowest priority)
//! - Project-local: `.feed-loader.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Project-local config file name.
const PROJECT_CONFIG_FILE: &str = ".feed-loader.toml";

/// Upper bound for `general.concurrency`.
pub const MAX_CONCURRENCY: usize = 64;

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// HTTP settings.
    pub remote: RemoteConfig,
    /// Disk cache settings.
    pub cache: CacheConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Maximum loads in flight at once.
    pub concurrency: Option<usize>,
}

/// HTTP configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
}

/// Disk cache configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable/disable the disk cache.
    pub enabled: Option<bool>,
    /// Custom cache directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/feed-loader/config.toml`
    /// 2. Project-local: `.feed-loader.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(c) = self.general.concurrency {
            if !(1..=MAX_CONCURRENCY).contains(&c) {
                return Err(format!(
                    "general.concurrency must be 1-{MAX_CONCURRENCY}, got {c}"
                ));
            }
        }
        if self.remote.timeout_secs == Some(0) {
            return Err("remote.timeout_secs must be greater than 0".to_string());
        }
        if let Some(ref ua) = self.remote.user_agent {
            if ua.trim().is_empty() {
                return Err("remote.user_agent must not be empty".to_string());
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.concurrency = other.general.concurrency.or(self.general.concurrency);

        // Remote
        self.remote.timeout_secs = other.remote.timeout_secs.or(self.remote.timeout_secs);
        self.remote.user_agent = other
            .remote
            .user_agent
            .or_else(|| self.remote.user_agent.take());

        // Cache
        self.cache.enabled = other.cache.enabled.or(self.cache.enabled);
        self.cache.dir = other.cache.dir.or_else(|| self.cache.dir.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("feed-loader").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.feed-loader.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
