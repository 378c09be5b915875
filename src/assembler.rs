//! Concatenation of fetched chunk files into the final output

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Failed to create output {}: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read chunk {}: {source}", .path.display())]
    ReadChunk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AssembleError>;

#[derive(Debug, Clone)]
pub struct Assembler {
    buffer_size: usize,
}

impl Assembler {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Write the chunks, in order, into `output` and return the byte count
    ///
    /// An existing output is truncated. On error the output is left as far as
    /// it got; it is not removed. Every file handle is scoped to this call and
    /// closed on all paths.
    pub async fn assemble(&self, chunks: &[PathBuf], output: &Path) -> Result<u64> {
        let create_err = |source: std::io::Error| AssembleError::CreateOutput {
            path: output.to_path_buf(),
            source,
        };
        let write_err = |source: std::io::Error| AssembleError::WriteOutput {
            path: output.to_path_buf(),
            source,
        };

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).await.map_err(create_err)?;
        }

        let file = File::create(output).await.map_err(create_err)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total: u64 = 0;

        for chunk in chunks {
            let read_err = |source: std::io::Error| AssembleError::ReadChunk {
                path: chunk.clone(),
                source,
            };

            let mut reader = File::open(chunk).await.map_err(read_err)?;
            let mut chunk_bytes: u64 = 0;

            loop {
                let n = reader.read(&mut buffer).await.map_err(read_err)?;
                if n == 0 {
                    break;
                }
                writer.write_all(&buffer[..n]).await.map_err(write_err)?;
                chunk_bytes += n as u64;
            }

            debug!(chunk = %chunk.display(), bytes = chunk_bytes, "Chunk appended");
            total += chunk_bytes;
        }

        writer.flush().await.map_err(write_err)?;
        writer.into_inner().sync_all().await.map_err(write_err)?;

        Ok(total)
    }
}
