//! CLI command implementations.

pub mod config;
pub mod delete;
pub mod exists;
pub mod list;
pub mod show;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use semvault_backend::{
    LoadOptions, LocalDiskStrategy, MemoryModelCache, ModelRepository, PersistenceStrategy,
};
use semvault_config::{ConfigLoader, StrategyType, VaultConfig};
use semvault_core::security::sanitize_entity_name;

use crate::GlobalOptions;

/// Load the merged configuration for the current directory.
pub fn load_config(global: &GlobalOptions) -> Result<VaultConfig> {
    let workspace = std::env::current_dir().context("Failed to get current directory")?;
    let overrides = global.to_config_overrides();
    ConfigLoader::new()
        .load(&workspace, Some(&overrides))
        .context("Failed to load configuration")
}

/// Resolve the vault directory from config and the current directory.
pub fn resolve_vault_dir(config: &VaultConfig) -> Result<PathBuf> {
    let workspace = std::env::current_dir().context("Failed to get current directory")?;
    Ok(config.vault_dir(&workspace))
}

/// Resolve the storage directory of one named model inside the vault.
pub fn model_path(config: &VaultConfig, name: &str) -> Result<PathBuf> {
    let vault_dir = resolve_vault_dir(config)?;
    let dir_name = sanitize_entity_name(name, true).context("Invalid model name")?;
    Ok(vault_dir.join(dir_name))
}

/// Build a repository from the loaded configuration.
pub fn create_repository(config: &VaultConfig) -> Result<ModelRepository> {
    let strategy: Arc<dyn PersistenceStrategy> = match config.storage.strategy {
        StrategyType::LocalDisk => Arc::new(
            LocalDiskStrategy::new().with_extended_paths(config.storage.allow_extended_paths),
        ),
    };

    let mut builder = ModelRepository::builder()
        .strategy(strategy)
        .max_concurrency(config.repository.max_concurrent_operations)
        .allow_extended_paths(config.storage.allow_extended_paths);
    if config.cache.enabled {
        builder = builder.cache(Arc::new(MemoryModelCache::new(
            config.cache.max_models,
            config.cache.ttl(),
            config.cache.statistics,
        )));
    }
    builder.build().context("Failed to build repository")
}

/// Load options matching the configuration.
pub fn load_options(config: &VaultConfig) -> LoadOptions {
    LoadOptions {
        caching: config.cache.enabled,
        ..LoadOptions::default()
    }
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
