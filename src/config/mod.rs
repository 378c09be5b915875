//! Settings for storage, the freshness cache, HTTP and logging
//!
//! Values are layered, later layers winning: struct defaults, then the TOML
//! file, then `CHUNKFETCH__<SECTION>__<KEY>` environment variables (a `.env`
//! file is read first, if present).
//!
//! ```no_run
//! use chunkfetch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Chunks are stored under: {}", config.storage.root.display());
//! ```
//!
//! Overrides look like `CHUNKFETCH__STORAGE__ROOT=/sdcard/maps`,
//! `CHUNKFETCH__HTTP__BUFFER_SIZE=16KB` or `CHUNKFETCH__CACHE__PERSISTENT=false`.
//!
//! The file is `config/chunkfetch.toml` unless `--config` or
//! `CHUNKFETCH_CONFIG` names another one.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{AssemblyConfig, CacheConfig, Config, HttpConfig, StorageConfig, TelemetryConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load and validate from the default file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Config::load`], with an explicit file taking precedence over
    /// `CHUNKFETCH_CONFIG`
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load from `path`, skipping `.env` and `CHUNKFETCH_CONFIG`
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[storage]\nroot = \"/data/maps\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/data/maps"));
        assert_eq!(config.cache.path, PathBuf::from("data/freshness"));
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[http]\nbuffer_size = 0\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ZeroBufferSize { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[http]\nbuffer_size = \"lots\"\n").unwrap();

        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::LoadError(_))
        ));
    }
}
