//! Tracing setup and in-process counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
/// Logs go to stderr so stdout stays free for job events.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Counters shared by every job of a [`crate::Downloader`]
#[derive(Debug, Default)]
pub struct Metrics {
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    chunks_downloaded: AtomicU64,
    chunks_fresh: AtomicU64,
    bytes_downloaded: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_completed", "Metric incremented");
    }

    pub fn job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_failed", "Metric incremented");
    }

    pub fn chunk_downloaded(&self, bytes: u64) {
        self.chunks_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
        tracing::debug!(counter = "chunks_downloaded", bytes, "Metric incremented");
    }

    pub fn chunk_fresh(&self) {
        self.chunks_fresh.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "chunks_fresh", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            chunks_downloaded: self.chunks_downloaded.load(Ordering::Relaxed),
            chunks_fresh: self.chunks_fresh.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub chunks_downloaded: u64,
    pub chunks_fresh: u64,
    pub bytes_downloaded: u64,
}
