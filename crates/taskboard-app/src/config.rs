//! Project configuration read from `config.toml` in the data directory.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use taskboard_core::Strategy;
use taskboard_store::{RetryPolicy, validate_key};

use crate::task_store::DEFAULT_STORAGE_KEY;

/// File name looked up inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration loaded from `<data-dir>/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Filter settings.
    #[serde(default)]
    pub filters: FilterConfig,
}

impl ProjectConfig {
    /// Load configuration from `data_dir`, falling back to defaults when no file exists.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(&config_path)
    }

    /// Load configuration from an explicit file.
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("failed to parse {}", config_path.display()))
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_key(&self.storage.key)
            .with_context(|| format!("storage.key '{}' is not a plain name", self.storage.key))?;
        if self.storage.retry.attempts == 0 {
            bail!("storage.retry.attempts must be at least 1");
        }
        if Strategy::from_name(&self.filters.default).is_none() {
            let known = Strategy::BUILTIN.map(Strategy::name).join(", ");
            bail!(
                "filters.default '{}' is not a built-in filter. Allowed values: {known}.",
                self.filters.default
            );
        }
        Ok(())
    }
}

/// Storage block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Blob key holding the task list.
    pub key: String,
    /// Override for the data directory.
    pub dir: Option<PathBuf>,
    /// Retry policy for transient write/read failures.
    pub retry: RetryConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_owned(),
            dir: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry block.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub attempts: u32,
    /// Initial backoff in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.attempts,
            base_delay_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl RetryConfig {
    /// Convert into the store-level policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

/// Filter block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Reject unknown filter names instead of returning the list unfiltered.
    pub strict: bool,
    /// Category applied when none is requested.
    pub default: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strict: false,
            default: Strategy::All.name().to_owned(),
        }
    }
}
