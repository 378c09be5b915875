//! On-disk locations of chunk files and assembled outputs
//!
//! ```text
//! <root>/<temp_dir>/<filename>.chunk<index>   one file per fetched chunk
//! <root>/<filename>                           assembled output
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    temp_dir: PathBuf,
}

impl StorageLayout {
    /// The root is made absolute so outputs can be reported as `file://` URIs
    pub fn new(root: impl AsRef<Path>, temp_dir: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self {
            root: std::path::absolute(root.as_ref())?,
            temp_dir: temp_dir.into(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> io::Result<Self> {
        Self::new(&config.root, config.temp_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Temp file for chunk `index` of the output named `filename`
    pub fn chunk_path(&self, filename: &str, index: usize) -> PathBuf {
        self.root
            .join(&self.temp_dir)
            .join(format!("{filename}.chunk{index}"))
    }

    /// All temp chunk files of a job, in assembly order
    pub fn chunk_paths(&self, filename: &str, count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| self.chunk_path(filename, i)).collect()
    }

    /// Final location of the assembled output
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}
