use thiserror::Error;

use crate::assembler::AssembleError;
use crate::fetcher::FetchError;

/// Why a job ended in failure
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job description: {0}")]
    InvalidInput(String),

    #[error("Invalid URL for chunk {index}: '{location}' ({reason})")]
    InvalidUrl {
        index: usize,
        location: String,
        reason: String,
    },

    #[error("Unable to download chunk {index}: {source}")]
    ChunkDownload {
        index: usize,
        #[source]
        source: FetchError,
    },

    #[error("Unable to assemble output: {0}")]
    Assembly(#[from] AssembleError),
}

impl JobError {
    /// Stable identifier reported as `reason` in the terminal event
    pub fn code(&self) -> &'static str {
        match self {
            JobError::InvalidInput(_) => "InvalidInput",
            JobError::InvalidUrl { .. } => "InvalidURL",
            JobError::ChunkDownload { .. } => "ChunkDownloadError",
            JobError::Assembly(_) => "AssemblyError",
        }
    }
}

impl From<serde_json::Error> for JobError {
    fn from(value: serde_json::Error) -> Self {
        JobError::InvalidInput(value.to_string())
    }
}
