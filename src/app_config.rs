//! Module for application configuration settings.
//!
//! User configurations may be specified in a configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use http::StatusCode;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use anyfs::fs::local::DEFAULT_ROOT;
use anyfs::{BlobConfig, CacheConfig, RetryPolicy};

fn default_local_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_ttl_secs() -> u64 {
    120
}

/// Node cache sizing for one filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheSection {
    /// Maximum number of cached nodes. Zero disables caching.
    #[serde(default)]
    pub capacity: usize,

    /// Lifetime of a cached node, in seconds. Zero disables caching.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheSection {
    fn disabled() -> Self {
        Self {
            capacity: 0,
            ttl_secs: default_ttl_secs(),
        }
    }

    fn enabled() -> Self {
        let defaults = CacheConfig::default();
        Self {
            capacity: defaults.capacity,
            ttl_secs: defaults.ttl.as_secs(),
        }
    }
}

impl From<&CacheSection> for CacheConfig {
    fn from(section: &CacheSection) -> Self {
        Self {
            capacity: section.capacity,
            ttl: Duration::from_secs(section.ttl_secs),
        }
    }
}

/// Local disk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalSection {
    /// The root of the local filesystem. Absolute paths given on the command
    /// line must lie under it.
    #[serde(default = "default_local_root")]
    pub root: PathBuf,

    /// Node cache. Disabled unless configured.
    #[serde(default = "CacheSection::disabled")]
    pub cache: CacheSection,
}

impl Default for LocalSection {
    fn default() -> Self {
        Self {
            root: default_local_root(),
            cache: CacheSection::disabled(),
        }
    }
}

/// Blob container configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BlobSection {
    /// Storage account name.
    pub account: Option<String>,

    /// Container name.
    pub container: Option<String>,

    /// Service host, overriding the account-derived one.
    pub host: Option<String>,

    /// Full service or container URL, overriding host and account.
    pub url: Option<String>,

    /// Base64 shared key for the account. Mutually exclusive with `token`.
    pub account_key: Option<SecretString>,

    /// Bearer token. Mutually exclusive with `account-key`.
    pub token: Option<SecretString>,

    /// Node cache.
    #[serde(default = "CacheSection::enabled")]
    pub cache: CacheSection,
}

/// Retry behavior for remote requests. Unset keys take the library defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpSection {
    /// Upper bound on one physical attempt, in seconds.
    pub timeout_secs: u64,

    /// Maximum physical attempts per request.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,

    /// Growth factor of the retry delay.
    pub delay_factor: f64,

    /// Statuses that are retried.
    pub transient_statuses: Vec<u16>,
}

impl Default for HttpSection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        let mut transient_statuses: Vec<u16> = policy
            .transient_statuses
            .iter()
            .map(StatusCode::as_u16)
            .collect();
        transient_statuses.sort_unstable();
        Self {
            timeout_secs: policy.timeout.as_secs(),
            max_attempts: policy.max_attempts,
            initial_delay_ms: u64::try_from(policy.initial_delay.as_millis()).unwrap_or(u64::MAX),
            delay_factor: policy.delay_factor,
            transient_statuses,
        }
    }
}

impl HttpSection {
    /// The retry policy this section describes. Invalid status codes are
    /// skipped; [`Config::validate`] reports them.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            delay_factor: self.delay_factor,
            transient_statuses: self
                .transient_statuses
                .iter()
                .filter_map(|code| StatusCode::from_u16(*code).ok())
                .collect(),
        }
    }
}

/// Application configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub local: LocalSection,

    #[serde(default)]
    pub blob: Option<BlobSection>,

    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation errors: {0:?}")]
    ValidationErrors(Vec<String>),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Config {
    /// Validate the correctness of the configuration.
    ///
    /// Returns:
    /// - `Ok(())` if the configuration is valid.
    /// - `Err(Vec<String>)` containing a list of validation error messages otherwise.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.local.root.is_absolute() {
            errors.push(format!(
                "Local root '{}' is not an absolute path.",
                self.local.root.display()
            ));
        }

        if let Some(blob) = &self.blob {
            if blob.account_key.is_some() && blob.token.is_some() {
                errors.push("Blob 'account-key' and 'token' are mutually exclusive.".to_owned());
            }
            if blob.account_key.is_some() && blob.account.is_none() {
                errors.push("Blob 'account-key' requires 'account'.".to_owned());
            }
            if let Err(e) = self.blob_config(blob).container_url() {
                errors.push(format!("Blob container is misconfigured: {e}."));
            }
        }

        if self.http.timeout_secs == 0 {
            errors.push("HTTP 'timeout-secs' must be at least 1.".to_owned());
        }
        if self.http.max_attempts == 0 {
            errors.push("HTTP 'max-attempts' must be at least 1.".to_owned());
        }
        if !self.http.delay_factor.is_finite() || self.http.delay_factor < 1.0 {
            errors.push(format!(
                "HTTP 'delay-factor' must be a finite number of at least 1, got {}.",
                self.http.delay_factor
            ));
        }
        for code in &self.http.transient_statuses {
            if StatusCode::from_u16(*code).is_err() {
                errors.push(format!("HTTP transient status {code} is not a status code."));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The library-level configuration of the blob container in `blob`.
    pub fn blob_config(&self, blob: &BlobSection) -> BlobConfig {
        BlobConfig {
            account: blob.account.clone(),
            container: blob.container.clone(),
            host: blob.host.clone(),
            url: blob.url.clone(),
            cache: CacheConfig::from(&blob.cache),
            retry: self.http.retry_policy(),
        }
    }

    /// Returns config file paths in descending priority order.
    /// On macOS, skips `dirs::config_dir()` (resolves to ~/Library/Application Support/).
    fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(not(target_os = "macos"))]
        if let Some(xdg) = dirs::config_dir() {
            paths.push(xdg.join("anyfs").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("anyfs").join("config.toml"));
        }

        paths.push(PathBuf::from("/etc/anyfs/config.toml"));

        paths
    }

    /// Finds the first existing config file from search paths.
    fn find_config_file() -> Option<PathBuf> {
        Self::config_search_paths().into_iter().find(|p| p.exists())
    }

    /// Loads config from a single TOML file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = ?path, "Loading configuration file.");
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads configuration from the external path if given, else the first
    /// config file found, else the defaults.
    pub fn load(external_config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match external_config_path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };
        let Some(path) = path else {
            debug!("No configuration file found, using defaults.");
            return Ok(Self::default());
        };

        let config = Self::load_from_file(&path)?;
        config.validate().map_err(ConfigError::ValidationErrors)?;
        debug!("Loaded configuration successfully.");
        Ok(config)
    }
}
