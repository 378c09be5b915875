//! Single-chunk download with freshness short-circuit
//!
//! [`ChunkFetcher::fetch`] requests a chunk, compares the response's
//! `Last-Modified`/`Expires` against the [`FreshnessCache`] and either reuses
//! the chunk file already on disk or streams the body into it, reporting
//! progress to the job's [`ResultSink`].

mod freshness;
pub mod http;

pub use freshness::RemoteMetadata;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::cache::FreshnessCache;
use crate::events::{ProgressEvent, ResultSink, fraction};
use crate::observability::Metrics;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(StatusCode),

    #[error("Failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write chunk file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// How a successful fetch was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Remote copy unchanged; the existing chunk file was kept untouched
    Fresh,
    /// Body streamed to the destination
    Downloaded { bytes: u64 },
}

pub struct ChunkFetcher {
    client: Client,
    cache: Arc<dyn FreshnessCache>,
    buffer_size: usize,
    metrics: Arc<Metrics>,
}

impl ChunkFetcher {
    pub fn new(
        client: Client,
        cache: Arc<dyn FreshnessCache>,
        buffer_size: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            client,
            cache,
            buffer_size: buffer_size.max(1),
            metrics,
        }
    }

    /// Make `destination` hold the current bytes of `location`
    ///
    /// Skips the body when the cache says the chunk is fresh and the file is
    /// present. Only `200 OK` is accepted for a transfer. The body is written
    /// to a sibling `.part` file and renamed into place, so `destination` is
    /// never left truncated. The freshness record is updated only after the
    /// rename.
    pub async fn fetch(
        &self,
        location: &Url,
        destination: &Path,
        sink: &dyn ResultSink,
    ) -> Result<FetchOutcome> {
        let url = location.as_str();
        debug!(url, path = %destination.display(), "Requesting chunk");

        let response = self
            .client
            .get(location.clone())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let remote = RemoteMetadata::from_headers(response.headers(), now_ms());
        let last_update = self.cache.get(url);

        if !remote.is_stale(last_update) {
            if fs::try_exists(destination).await.unwrap_or(false) {
                debug!(url, last_update, "Chunk unchanged since last download, reusing file");
                self.metrics.chunk_fresh();
                return Ok(FetchOutcome::Fresh);
            }
            warn!(
                url,
                path = %destination.display(),
                "Chunk is fresh but its file is missing, downloading again"
            );
        }

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let bytes = self.write_body(response, destination, sink).await?;

        self.cache.set(url, now_ms());
        self.metrics.chunk_downloaded(bytes);
        debug!(url, bytes, "Chunk downloaded");

        Ok(FetchOutcome::Downloaded { bytes })
    }

    async fn write_body(
        &self,
        response: Response,
        destination: &Path,
        sink: &dyn ResultSink,
    ) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let part = part_path(destination);
        let result = self.stream_to(response, &part, sink).await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };

        fs::rename(&part, destination)
            .await
            .map_err(|source| FetchError::Write {
                path: destination.to_path_buf(),
                source,
            })?;

        Ok(bytes)
    }

    async fn stream_to(
        &self,
        mut response: Response,
        path: &Path,
        sink: &dyn ResultSink,
    ) -> Result<u64> {
        let write_err = |source: std::io::Error| FetchError::Write {
            path: path.to_path_buf(),
            source,
        };

        let total = response.content_length();
        sink.on_progress(ProgressEvent::downloading(total.map(|_| 0.0)))
            .await;

        let file = File::create(path).await.map_err(write_err)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(FetchError::Body)? {
            writer.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;

            if let Some(total) = total.filter(|t| *t > 0) {
                sink.on_progress(ProgressEvent::downloading(Some(fraction(written, total))))
                    .await;
            }
        }

        writer.flush().await.map_err(write_err)?;
        writer.into_inner().sync_all().await.map_err(write_err)?;

        Ok(written)
    }
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_is_sibling() {
        assert_eq!(
            part_path(Path::new("/data/temp/bundle.bin.chunk3")),
            PathBuf::from("/data/temp/bundle.bin.chunk3.part")
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }
}
