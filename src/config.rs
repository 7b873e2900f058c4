//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! point at the public La Grotte de Juju resources repository, so an empty
//! (or absent) config file is a working setup.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [github]
//! api_base = "https://api.github.com"
//! raw_base = "https://raw.githubusercontent.com"
//! owner = "La-grotte-de-Juju"
//! repo = "La-grotte-de-Juju-Ressources"
//! branch = "main"
//! user_agent = "juju-gallery"
//! timeout_secs = 15
//! # token = "ghp_..."       # Lifts the anonymous rate limit
//!
//! [gallery]
//! folder = "Fanarts/classic"
//! page_size = 24            # Tiles per "load more" step
//! columns = 6               # Bento grid width
//!
//! [cache]
//! dir = ".juju-gallery-cache"
//! ttl_minutes = 30
//!
//! [comics]
//! folder = "BD"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want.
//!
//! ```toml
//! [gallery]
//! folder = "Fanarts/chibi"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the content lives and how to reach it.
    pub github: GithubConfig,
    /// Fan-art grid settings.
    pub gallery: GalleryConfig,
    /// Local cache location and freshness.
    pub cache: CacheConfig,
    /// Comic library location.
    pub comics: ComicsConfig,
    /// Proxy server settings.
    pub server: ServerConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.owner.trim().is_empty() || self.github.repo.trim().is_empty() {
            return Err(ConfigError::Validation(
                "github.owner and github.repo must not be empty".into(),
            ));
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "github.timeout_secs must be at least 1".into(),
            ));
        }
        if self.gallery.page_size == 0 {
            return Err(ConfigError::Validation(
                "gallery.page_size must be at least 1".into(),
            ));
        }
        if self.gallery.columns < 3 {
            return Err(ConfigError::Validation(
                "gallery.columns must be at least 3 (wide tiles span three columns)".into(),
            ));
        }
        if self.cache.ttl_minutes == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Cache namespace for the configured fan-art folder.
    pub fn gallery_cache_key(&self) -> String {
        format!(
            "gallery:{}/{}/{}",
            self.github.owner, self.github.repo, self.gallery.folder
        )
    }
}

/// Remote host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// REST API root, without trailing slash.
    pub api_base: String,
    /// Raw-content host used to build page URLs.
    pub raw_base: String,
    pub owner: String,
    pub repo: String,
    /// Branch used for raw-content URLs.
    pub branch: String,
    /// GitHub rejects requests without a User-Agent.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional personal access token. Anonymous clients get 60 requests
    /// per hour, which one gallery load can exhaust.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl GithubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{raw_base}/{owner}/{repo}/{branch}`, the prefix for raw file URLs.
    pub fn raw_root(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch
        )
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            owner: "La-grotte-de-Juju".to_string(),
            repo: "La-grotte-de-Juju-Ressources".to_string(),
            branch: "main".to_string(),
            user_agent: "juju-gallery".to_string(),
            timeout_secs: 15,
            token: None,
        }
    }
}

/// Fan-art grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Repository folder holding the fan-art images.
    pub folder: String,
    /// Tiles revealed per "load more" step.
    pub page_size: usize,
    /// Width of the bento grid in cells.
    pub columns: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            folder: "Fanarts/classic".to_string(),
            page_size: 24,
            columns: 6,
        }
    }
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory holding one file per cache key.
    pub dir: PathBuf,
    /// Minutes a snapshot stays fresh.
    pub ttl_minutes: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes as i64)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".juju-gallery-cache"),
            ttl_minutes: 30,
        }
    }
}

/// Comic library settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComicsConfig {
    /// Repository folder whose sub-folders are individual comics.
    pub folder: String,
}

impl Default for ComicsConfig {
    fn default() -> Self {
        Self {
            folder: "BD".to_string(),
        }
    }
}

/// Proxy server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# juju-gallery configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Remote content host
# ---------------------------------------------------------------------------
[github]
api_base = "https://api.github.com"
# Raw file host; page URLs are {raw_base}/{owner}/{repo}/{branch}/{path}.
raw_base = "https://raw.githubusercontent.com"
owner = "La-grotte-de-Juju"
repo = "La-grotte-de-Juju-Ressources"
branch = "main"
user_agent = "juju-gallery"
timeout_secs = 15
# Personal access token. Anonymous clients are limited to 60 requests per
# hour and every image costs one commit lookup.
# token = "ghp_..."

# ---------------------------------------------------------------------------
# Fan-art gallery
# ---------------------------------------------------------------------------
[gallery]
folder = "Fanarts/classic"
# Tiles revealed per "load more" step.
page_size = 24
# Bento grid width in cells (at least 3).
columns = 6

# ---------------------------------------------------------------------------
# Local cache
# ---------------------------------------------------------------------------
[cache]
dir = ".juju-gallery-cache"
# A snapshot older than this is refetched in full.
ttl_minutes = 30

# ---------------------------------------------------------------------------
# Comic library
# ---------------------------------------------------------------------------
[comics]
# Each sub-folder is one comic; its images are the pages.
folder = "BD"

# ---------------------------------------------------------------------------
# Proxy server (`juju-gallery serve`)
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3000"
"##
}
