//! Semvault Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.semvault/config.toml`
//! - Local config: `.semvault/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for Semvault.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Repository configuration
    pub repository: RepositoryConfig,

    /// Model cache configuration
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Storage configuration for model data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for model storage (default: `.semvault`)
    pub vault_dir: PathBuf,

    /// Persistence strategy to use
    pub strategy: StrategyType,

    /// Allow storage paths beyond the classic 260-character limit
    pub allow_extended_paths: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vault_dir: PathBuf::from(".semvault"),
            strategy: StrategyType::default(),
            allow_extended_paths: false,
        }
    }
}

/// Persistence strategy selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyType {
    /// Local filesystem storage (default)
    #[default]
    LocalDisk,
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalDisk => write!(f, "local-disk"),
        }
    }
}

impl std::str::FromStr for StrategyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local-disk" | "localdisk" | "local_disk" | "local" => Ok(Self::LocalDisk),
            _ => Err(ConfigError::invalid_value(
                "storage.strategy",
                format!("unknown strategy '{}'. Valid values: local-disk", s),
            )),
        }
    }
}

/// Repository concurrency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Maximum concurrent storage operations across all paths
    pub max_concurrent_operations: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 10,
        }
    }
}

/// Model cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve repeat loads from the cache
    pub enabled: bool,

    /// Maximum number of cached models
    pub max_models: usize,

    /// Time-to-live for cached models in seconds (0 = no expiry)
    pub ttl_seconds: u64,

    /// Collect hit/miss statistics
    pub statistics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_models: 32,
            ttl_seconds: 1800,
            statistics: true,
        }
    }
}

impl CacheConfig {
    /// TTL as a `Duration`, `None` when expiry is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        if self.ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.ttl_seconds))
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,

    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override the vault directory
    pub vault_dir: Option<PathBuf>,

    /// Override the persistence strategy
    pub strategy: Option<StrategyType>,

    /// Override the repository concurrency bound
    pub max_concurrent_operations: Option<usize>,

    /// Override the cache capacity
    pub cache_max_models: Option<usize>,

    /// Override log level
    pub log_level: Option<String>,
}

impl VaultConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref dir) = overrides.vault_dir {
            self.storage.vault_dir = dir.clone();
        }

        if let Some(strategy) = overrides.strategy {
            self.storage.strategy = strategy;
        }

        if let Some(max) = overrides.max_concurrent_operations {
            self.repository.max_concurrent_operations = max;
        }

        if let Some(max_models) = overrides.cache_max_models {
            self.cache.max_models = max_models;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.max_concurrent_operations == 0 {
            return Err(ConfigError::invalid_value(
                "repository.max_concurrent_operations",
                "must be at least 1",
            ));
        }
        if self.cache.max_models == 0 {
            return Err(ConfigError::invalid_value(
                "cache.max_models",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Get the effective vault directory for a workspace.
    pub fn vault_dir(&self, workspace_root: &std::path::Path) -> PathBuf {
        if self.storage.vault_dir.is_absolute() {
            self.storage.vault_dir.clone()
        } else {
            workspace_root.join(&self.storage.vault_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.storage.vault_dir, PathBuf::from(".semvault"));
        assert_eq!(config.storage.strategy, StrategyType::LocalDisk);
        assert_eq!(config.repository.max_concurrent_operations, 10);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_models, 32);
        assert!(config.cache.statistics);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = VaultConfig::default();
        let overrides = ConfigOverrides {
            vault_dir: Some(PathBuf::from("/custom/vault")),
            max_concurrent_operations: Some(4),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.storage.vault_dir, PathBuf::from("/custom/vault"));
        assert_eq!(config.repository.max_concurrent_operations, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_vault_dir_resolution() {
        let config = VaultConfig::default();
        let workspace = PathBuf::from("/home/user/project");
        assert_eq!(
            config.vault_dir(&workspace),
            PathBuf::from("/home/user/project/.semvault")
        );

        let mut config = VaultConfig::default();
        config.storage.vault_dir = PathBuf::from("/absolute/vault");
        assert_eq!(config.vault_dir(&workspace), PathBuf::from("/absolute/vault"));
    }

    #[test]
    fn test_cache_ttl() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl(), Some(Duration::from_secs(1800)));

        let config = CacheConfig {
            ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.ttl(), None);
    }

    #[test]
    fn test_strategy_type_display_and_from_str() {
        assert_eq!(StrategyType::LocalDisk.to_string(), "local-disk");
        assert_eq!(
            "local-disk".parse::<StrategyType>().unwrap(),
            StrategyType::LocalDisk
        );
        assert_eq!(
            "localdisk".parse::<StrategyType>().unwrap(),
            StrategyType::LocalDisk
        );
        assert!("s3".parse::<StrategyType>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = VaultConfig::default();
        assert!(config.validate().is_ok());

        config.repository.max_concurrent_operations = 0;
        assert!(config.validate().is_err());

        config.repository.max_concurrent_operations = 10;
        config.cache.max_models = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = VaultConfig::default();
        config.storage.vault_dir = PathBuf::from("/data/vault");
        config.cache.ttl_seconds = 60;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: VaultConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.storage.vault_dir, PathBuf::from("/data/vault"));
        assert_eq!(parsed.cache.ttl_seconds, 60);
    }
}
