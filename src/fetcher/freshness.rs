//! Deciding whether a cached chunk can be reused

use chrono::DateTime;
use reqwest::header::{EXPIRES, HeaderMap, HeaderName, LAST_MODIFIED};

/// Remote validity window of a chunk, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub last_modified: i64,
    pub expires: i64,
}

impl RemoteMetadata {
    /// Read `Last-Modified` and `Expires`; a missing or unparseable header
    /// counts as `now_ms`
    pub fn from_headers(headers: &HeaderMap, now_ms: i64) -> Self {
        Self {
            last_modified: header_date_ms(headers, LAST_MODIFIED).unwrap_or(now_ms),
            expires: header_date_ms(headers, EXPIRES).unwrap_or(now_ms),
        }
    }

    /// The chunk must be downloaded again if it changed after `last_update`
    /// or its cache lifetime ended before it
    pub fn is_stale(&self, last_update: i64) -> bool {
        self.last_modified > last_update || self.expires < last_update
    }
}

fn header_date_ms(headers: &HeaderMap, name: HeaderName) -> Option<i64> {
    let value = headers.get(&name)?.to_str().ok()?;
    match DateTime::parse_from_rfc2822(value.trim()) {
        Ok(date) => Some(date.timestamp_millis()),
        Err(e) => {
            tracing::debug!(header = %name, value, error = %e, "Ignoring unparseable date header");
            None
        }
    }
}
