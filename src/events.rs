//! Progress and terminal events delivered to the job's caller
//!
//! A job emits zero or more [`ProgressEvent`]s followed by exactly one
//! terminal [`Outcome`]. Events reach the caller through a [`ResultSink`];
//! [`ChannelSink`] forwards them over an mpsc channel as [`JobEvent`]s.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::job::JobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DownloadStatus {
    Downloading,
    Error,
}

/// Intermediate status report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub status: DownloadStatus,
    /// Fraction of the current chunk written, in `[0, 1]`; absent when the
    /// server did not announce a content length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(progress: Option<f64>) -> Self {
        Self {
            status: DownloadStatus::Downloading,
            progress,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Error,
            progress: None,
            error: Some(message.into()),
        }
    }
}

/// Fraction of `total` covered by `done`, computed in floating point
pub fn fraction(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (done as f64 / total as f64).min(1.0)
}

/// Terminal result of a job
#[derive(Debug)]
pub enum Outcome {
    Success { output_path: PathBuf },
    Failure { reason: JobError },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Wire form: `{"status":"OK","downloadedFileUrl":...}` or
    /// `{"status":"Error","reason":...,"error":...}`
    pub fn to_json(&self) -> Value {
        match self {
            Outcome::Success { output_path } => json!({
                "status": "OK",
                "downloadedFileUrl": file_uri(output_path),
            }),
            Outcome::Failure { reason } => {
                let mut body = json!(ProgressEvent::failed(reason.to_string()));
                body["reason"] = json!(reason.code());
                body
            }
        }
    }
}

/// `file://` URI for a local path
pub fn file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// What a [`ChannelSink`] delivers
#[derive(Debug)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Terminal(Outcome),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Terminal(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            JobEvent::Progress(event) => json!(event),
            JobEvent::Terminal(outcome) => outcome.to_json(),
        }
    }
}

/// Observer for job progress and the terminal outcome
///
/// `on_terminal` is called exactly once per job and nothing follows it.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn on_progress(&self, event: ProgressEvent);

    async fn on_terminal(&self, outcome: Outcome);
}

/// Forwards events over an unbounded channel so the producer never waits on
/// the consumer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: JobEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped, discarding event");
        }
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn on_progress(&self, event: ProgressEvent) {
        self.send(JobEvent::Progress(event));
    }

    async fn on_terminal(&self, outcome: Outcome) {
        self.send(JobEvent::Terminal(outcome));
    }
}
