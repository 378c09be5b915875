//! Download jobs: validation, sequential chunk fetching, assembly
//!
//! A job moves through
//!
//! ```text
//! Start ──validate──> FetchingChunks ──all ok──> Assembling ──ok──> Completed
//!   │                       │                        │
//!   └── InvalidInput /      └── ChunkDownloadError   └── AssemblyError ──> Failed
//!       InvalidURL ─────────────────────────────────────────────────────> Failed
//! ```
//!
//! Chunks are fetched strictly one after another. The first failure ends the
//! job; no later chunk is requested and assembly does not run.

mod error;
mod request;
mod runner;

pub use error::JobError;
pub use request::JobRequest;
pub use runner::JobRunner;

use reqwest::Url;
use uuid::Uuid;

/// One remote piece of the output, in assembly order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: usize,
    pub url: Url,
}

/// A validated job, ready to run
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: Uuid,
    pub output_name: String,
    pub chunks: Vec<ChunkDescriptor>,
}
