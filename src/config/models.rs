use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where chunk files and assembled outputs live
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// External storage root supplied by the host
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Directory under `root` that holds `<filename>.chunk<index>` files
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/files")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

/// Freshness cache persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// When false, freshness records live in memory for the process lifetime only
    #[serde(default = "default_persistent")]
    pub persistent: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            persistent: default_persistent(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/freshness")
}

fn default_persistent() -> bool {
    true
}

/// HTTP client settings used for chunk downloads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Write buffer used while streaming a chunk body to disk
    #[serde(default = "default_download_buffer")]
    pub buffer_size: ByteSize,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            buffer_size: default_download_buffer(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    concat!("chunkfetch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_redirects() -> usize {
    10
}

fn default_download_buffer() -> ByteSize {
    ByteSize::kib(4)
}

/// Chunk concatenation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_assembly_buffer")]
    pub buffer_size: ByteSize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_assembly_buffer(),
        }
    }
}

fn default_assembly_buffer() -> ByteSize {
    ByteSize::kib(1)
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
