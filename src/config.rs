use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::StoreOptions;

/// Contents of `emitter-cache.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Path to the SQLite file
    pub database: Option<String>,
    /// Write `<db>.pre-migration.bak` before upgrading an old schema (default: true)
    pub backup_before_migration: Option<bool>,
}

impl CacheConfig {
    pub fn store_options(&self) -> StoreOptions {
        let defaults = StoreOptions::default();
        StoreOptions {
            backup_before_migration: self
                .backup_before_migration
                .unwrap_or(defaults.backup_before_migration),
        }
    }

    /// Configured database path, or the default location under `base`
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(db) => PathBuf::from(db),
            None => default_database_path_in(base),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("emitter-cache.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".emitter-cache").join("rf.db")
}

/// Load the config file; a missing file is `Ok(None)`
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CacheConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CacheConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
