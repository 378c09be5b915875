//! Composition root: wires config, cache, HTTP client and runner together and
//! dispatches each job onto its own task

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::assembler::Assembler;
use crate::cache::{CacheError, FjallFreshnessCache, FreshnessCache, MemoryFreshnessCache};
use crate::config::Config;
use crate::events::{ChannelSink, JobEvent, Outcome};
use crate::fetcher::{ChunkFetcher, FetchError, http::build_client};
use crate::job::{JobRequest, JobRunner};
use crate::layout::StorageLayout;
use crate::observability::{Metrics, MetricsSnapshot};

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Failed to open freshness cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to set up HTTP client: {0}")]
    Http(#[from] FetchError),

    #[error("Invalid storage root: {0}")]
    Storage(#[from] std::io::Error),
}

/// Accepts job requests and runs each one on a dedicated task
#[derive(Clone)]
pub struct Downloader {
    runner: Arc<JobRunner>,
    metrics: Arc<Metrics>,
}

impl Downloader {
    /// Build from config, opening the persistent cache when enabled
    pub fn from_config(config: &Config) -> Result<Self, DownloaderError> {
        let cache: Arc<dyn FreshnessCache> = if config.cache.persistent {
            Arc::new(FjallFreshnessCache::open(&config.cache.path)?)
        } else {
            info!("Persistent cache disabled, freshness records kept in memory");
            Arc::new(MemoryFreshnessCache::new())
        };
        Self::with_cache(config, cache)
    }

    /// Build with an explicit cache implementation
    pub fn with_cache(
        config: &Config,
        cache: Arc<dyn FreshnessCache>,
    ) -> Result<Self, DownloaderError> {
        let metrics = Arc::new(Metrics::new());
        let layout = StorageLayout::from_config(&config.storage)?;
        info!(root = %layout.root().display(), "Storage layout ready");

        let fetcher = ChunkFetcher::new(
            build_client(&config.http)?,
            cache,
            config.http.buffer_size.as_usize(),
            metrics.clone(),
        );
        let assembler = Assembler::new(config.assembly.buffer_size.as_usize());

        let runner = JobRunner::new(Arc::new(fetcher), assembler, layout, metrics.clone());

        Ok(Self {
            runner: Arc::new(runner),
            metrics,
        })
    }

    /// Start a job in the background and return its event stream
    ///
    /// Must be called within a tokio runtime. Dropping the handle does not
    /// cancel the job.
    pub fn submit(&self, request: JobRequest) -> JobHandle {
        let (sink, events) = ChannelSink::channel();
        let runner = Arc::clone(&self.runner);

        let task = tokio::spawn(async move { runner.run(request, &sink).await });

        JobHandle { events, task }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Caller's side of a running job
pub struct JobHandle {
    events: mpsc::UnboundedReceiver<JobEvent>,
    task: JoinHandle<bool>,
}

impl JobHandle {
    /// Next event, or `None` once the terminal event has been consumed
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Wait for the job, returning its progress events and terminal outcome
    pub async fn wait(mut self) -> (Vec<JobEvent>, Option<Outcome>) {
        let mut progress = Vec::new();
        let mut terminal = None;

        while let Some(event) = self.events.recv().await {
            match event {
                JobEvent::Terminal(outcome) => terminal = Some(outcome),
                other => progress.push(other),
            }
        }

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Job task ended abnormally");
        }

        (progress, terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobError;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.root = temp_dir.path().join("files");
        config.cache.path = temp_dir.path().join("freshness");
        config
    }

    #[tokio::test]
    async fn test_from_config_opens_fjall_cache() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        Downloader::from_config(&config).unwrap();
        assert!(config.cache.path.exists());
    }

    #[tokio::test]
    async fn test_memory_cache_when_not_persistent() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.cache.persistent = false;

        Downloader::from_config(&config).unwrap();
        assert!(!config.cache.path.exists());
    }

    #[tokio::test]
    async fn test_submit_reports_terminal_event_last() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::from_config(&test_config(&temp_dir)).unwrap();

        let handle = downloader.submit(JobRequest::new(vec![], "a.bin"));
        let (progress, terminal) = handle.wait().await;

        assert!(progress.is_empty());
        assert!(matches!(
            terminal,
            Some(Outcome::Failure { reason: JobError::InvalidInput(_) })
        ));
        assert_eq!(downloader.metrics().jobs_failed, 1);
    }
}
