//! Client configuration
//!
//! Loaded from a YAML or TOML file (chosen by extension) and then
//! overridden from `PROMPTLY_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every API endpoint is appended to
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub activity_tracking: ActivityTrackingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the durable key-value file (supports ~)
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTrackingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            http: HttpSettings::default(),
            storage: StorageConfig::default(),
            activity_tracking: ActivityTrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for ActivityTrackingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Invalid YAML in {}: {}", path.display(), e)))?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        self.merge_env_from(|name| std::env::var(name).ok());
    }

    /// Merge overrides from an arbitrary variable lookup
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PROMPTLY_API_BASE_URL") {
            self.api_base_url = val;
        }

        if let Some(val) = lookup("PROMPTLY_STORAGE_PATH") {
            self.storage.path = val;
        }

        if let Some(val) = lookup("PROMPTLY_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(val) = lookup("PROMPTLY_ACTIVITY_TRACKING") {
            match val.parse::<bool>() {
                Ok(enabled) => self.activity_tracking.enabled = enabled,
                Err(_) => tracing::warn!(
                    "Invalid PROMPTLY_ACTIVITY_TRACKING '{}', keeping {}",
                    val,
                    self.activity_tracking.enabled
                ),
            }
        }

        if let Some(val) = lookup("PROMPTLY_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.http.timeout_secs = secs,
                Err(_) => tracing::warn!("Invalid PROMPTLY_TIMEOUT_SECS '{}', ignoring", val),
            }
        }
    }

    /// Check invariants the rest of the client relies on
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("'api_base_url' must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "'api_base_url' must be an http(s) URL, got '{}'",
                base
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("'http.timeout_secs' must be > 0".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// External login entry point
    pub fn login_url(&self) -> String {
        format!("{}/api/auth/login", self.base_url())
    }

    /// Storage path with `~` expanded
    pub fn storage_path(&self) -> Result<PathBuf> {
        expand_tilde(Path::new(&self.storage.path))
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    if let Ok(stripped) = path.strip_prefix("~") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8082/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

fn default_storage_path() -> String {
    "~/.promptly/storage.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
