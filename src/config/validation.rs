use super::models::Config;
use std::path::Component;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Buffer size must be positive: {field}")]
    ZeroBufferSize { field: &'static str },

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: &'static str },

    #[error("HTTP user agent must not be empty")]
    EmptyUserAgent,

    #[error("storage.temp_dir must be a non-empty relative path inside the storage root, got '{0}'")]
    InvalidTempDir(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_http(config)?;
    validate_assembly(config)?;
    validate_storage(config)?;
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    let http = &config.http;

    if http.buffer_size.is_zero() {
        return Err(ValidationError::ZeroBufferSize {
            field: "http.buffer_size",
        });
    }

    if http.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "http.connect_timeout_secs",
        });
    }

    if http.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "http.request_timeout_secs",
        });
    }

    if http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}

fn validate_assembly(config: &Config) -> Result<(), ValidationError> {
    if config.assembly.buffer_size.is_zero() {
        return Err(ValidationError::ZeroBufferSize {
            field: "assembly.buffer_size",
        });
    }
    Ok(())
}

/// The temp directory is joined onto the storage root, so it has to stay inside it
fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    let temp_dir = &config.storage.temp_dir;
    let escapes = temp_dir.as_os_str().is_empty()
        || temp_dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

    if escapes {
        return Err(ValidationError::InvalidTempDir(
            temp_dir.display().to_string(),
        ));
    }

    Ok(())
}
