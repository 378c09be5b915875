use std::path::PathBuf;
use std::sync::Arc;

use tracing::{Instrument, error, info, info_span};

use super::{DownloadJob, JobError, JobRequest};
use crate::assembler::Assembler;
use crate::events::{Outcome, ResultSink};
use crate::fetcher::{ChunkFetcher, FetchOutcome};
use crate::layout::StorageLayout;
use crate::observability::Metrics;

/// Drives one job from request to terminal event
pub struct JobRunner {
    fetcher: Arc<ChunkFetcher>,
    assembler: Assembler,
    layout: StorageLayout,
    metrics: Arc<Metrics>,
}

impl JobRunner {
    pub fn new(
        fetcher: Arc<ChunkFetcher>,
        assembler: Assembler,
        layout: StorageLayout,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            fetcher,
            assembler,
            layout,
            metrics,
        }
    }

    /// Validate and execute `request`, then report exactly one terminal
    /// outcome to `sink`. Returns whether the job completed.
    pub async fn run(&self, request: JobRequest, sink: &dyn ResultSink) -> bool {
        let result = match request.validate() {
            Ok(job) => {
                let span = info_span!("job", job_id = %job.id, output = %job.output_name);
                self.execute(&job, sink).instrument(span).await
            }
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(output_path) => {
                self.metrics.job_completed();
                info!(output = %output_path.display(), "Job completed");
                Outcome::Success { output_path }
            }
            Err(reason) => {
                self.metrics.job_failed();
                error!(reason = reason.code(), error = %reason, "Job failed");
                Outcome::Failure { reason }
            }
        };

        let completed = outcome.is_success();
        sink.on_terminal(outcome).await;
        completed
    }

    /// Fetch every chunk in order, then assemble. Progress goes to `sink`;
    /// the terminal outcome is left to the caller.
    pub async fn execute(
        &self,
        job: &DownloadJob,
        sink: &dyn ResultSink,
    ) -> Result<PathBuf, JobError> {
        info!(chunks = job.chunks.len(), "Starting job");

        let chunk_paths = self.layout.chunk_paths(&job.output_name, job.chunks.len());

        for (chunk, path) in job.chunks.iter().zip(&chunk_paths) {
            let outcome = self
                .fetcher
                .fetch(&chunk.url, path, sink)
                .await
                .map_err(|source| JobError::ChunkDownload {
                    index: chunk.index,
                    source,
                })?;

            match outcome {
                FetchOutcome::Fresh => info!(chunk = chunk.index, "Chunk up to date"),
                FetchOutcome::Downloaded { bytes } => {
                    info!(chunk = chunk.index, bytes, "Chunk fetched")
                }
            }
        }

        let output_path = self.layout.output_path(&job.output_name);
        let bytes = self.assembler.assemble(&chunk_paths, &output_path).await?;
        info!(bytes, output = %output_path.display(), "Output assembled");

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryFreshnessCache;
    use crate::events::{ChannelSink, JobEvent};
    use crate::fetcher::http::build_client;
    use crate::config::HttpConfig;
    use tempfile::TempDir;

    fn runner(root: &std::path::Path) -> (JobRunner, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let fetcher = ChunkFetcher::new(
            build_client(&HttpConfig::default()).unwrap(),
            Arc::new(MemoryFreshnessCache::new()),
            4096,
            metrics.clone(),
        );
        let runner = JobRunner::new(
            Arc::new(fetcher),
            Assembler::new(1024),
            StorageLayout::new(root, "temp").unwrap(),
            metrics.clone(),
        );
        (runner, metrics)
    }

    async fn drain(mut rx: tokio::sync::mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_empty_request_fails_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let (runner, metrics) = runner(temp_dir.path());
        let (sink, rx) = ChannelSink::channel();

        let completed = runner.run(JobRequest::new(vec![], "a.bin"), &sink).await;
        drop(sink);

        assert!(!completed);
        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            JobEvent::Terminal(Outcome::Failure { reason: JobError::InvalidInput(_) })
        ));
        assert_eq!(metrics.snapshot().jobs_failed, 1);
        assert_eq!(metrics.snapshot().chunks_downloaded, 0);
    }

    #[tokio::test]
    async fn test_invalid_url_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (runner, _metrics) = runner(temp_dir.path());
        let (sink, rx) = ChannelSink::channel();

        runner
            .run(JobRequest::new(vec!["not a url".to_string()], "a.bin"), &sink)
            .await;
        drop(sink);

        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            JobEvent::Terminal(Outcome::Failure { reason }) => {
                assert_eq!(reason.code(), "InvalidURL")
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
