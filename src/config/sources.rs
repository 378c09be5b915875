use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "CHUNKFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/chunkfetch.toml";
const ENV_PREFIX: &str = "CHUNKFETCH";
const ENV_SEPARATOR: &str = "__";

/// Resolve which TOML file to read: explicit path, `CHUNKFETCH_CONFIG`, or the default
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit: Option<PathBuf>) -> Result<Config, ConfigError> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    load_from_sources(config_path(explicit))
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // CHUNKFETCH__STORAGE__ROOT -> storage.root
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.storage.temp_dir, PathBuf::from("temp"));
        assert_eq!(config.http.max_redirects, 10);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("chunkfetch.toml");

        fs::write(
            &config_path,
            r#"
[storage]
root = "/var/lib/chunkfetch"
temp_dir = "parts"

[cache]
path = "/var/lib/chunkfetch/freshness"
persistent = false

[http]
connect_timeout_secs = 3
user_agent = "maps-app/2.1"
buffer_size = "64KB"

[assembly]
buffer_size = 8192

[telemetry]
log_level = "debug"
            "#,
        )
        .unwrap();

        let config = load_from_sources(config_path).unwrap();

        assert_eq!(config.storage.root, PathBuf::from("/var/lib/chunkfetch"));
        assert_eq!(config.storage.temp_dir, PathBuf::from("parts"));
        assert!(!config.cache.persistent);
        assert_eq!(config.http.connect_timeout_secs, 3);
        assert_eq!(config.http.user_agent, "maps-app/2.1");
        assert_eq!(config.http.buffer_size.as_usize(), 64 * 1024);
        assert_eq!(config.assembly.buffer_size.as_usize(), 8192);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/etc/chunkfetch/custom.toml");
        assert_eq!(config_path(Some(explicit.clone())), explicit);
    }
}
