//! Configuration for carbon-ledger

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LedgerError;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carbon-ledger")
}

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the ledger database
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// sled page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity_bytes: u64,

    /// Flush each map write to disk before returning
    #[serde(default = "default_true")]
    pub flush_on_write: bool,

    /// Identity used when the host does not supply one
    #[serde(default)]
    pub default_caller: Option<String>,
}

fn default_cache_capacity() -> u64 {
    64 * 1024 * 1024 // 64MB
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            cache_capacity_bytes: default_cache_capacity(),
            flush_on_write: true,
            default_caller: None,
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LedgerError> {
        let content = toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get ledger database path
    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join("ledger.sled")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(r#"storage_dir = "/var/lib/carbon""#).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/carbon"));
        assert_eq!(config.cache_capacity_bytes, 64 * 1024 * 1024);
        assert!(config.flush_on_write);
        assert_eq!(config.default_caller, None);
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/carbon/ledger.sled"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_dir: dir.path().to_path_buf(),
            cache_capacity_bytes: 1024,
            flush_on_write: false,
            default_caller: Some("uhCAk_alice".into()),
        };
        config.save(config.config_path()).unwrap();
        assert_eq!(Config::load(config.config_path()).unwrap(), config);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "flush_on_write = \"sometimes\"").unwrap();
        assert!(matches!(Config::load(&path), Err(LedgerError::Config(_))));
    }
}
