use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Corrupt freshness record for {key}: expected 8 bytes, found {len}")]
    CorruptRecord { key: String, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;
