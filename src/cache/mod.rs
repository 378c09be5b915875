//! Freshness records: when was each chunk location last downloaded successfully
//!
//! The cache maps a remote location to the epoch-millisecond timestamp of its
//! last complete download. [`crate::fetcher::ChunkFetcher`] is the only reader
//! and writer. Records outlive individual jobs and are never expired.
//!
//! Two implementations are provided:
//!
//! - [`FjallFreshnessCache`] persists records in an embedded fjall keyspace
//! - [`MemoryFreshnessCache`] keeps them in a map for tests and ephemeral runs
//!
//! Both are last-writer-wins per key; a concurrent `get`/`set` on one location
//! observes either the old or the new timestamp, never a torn value.

mod error;
mod memory;
mod store;

pub use error::{CacheError, Result};
pub use memory::MemoryFreshnessCache;
pub use store::FjallFreshnessCache;

/// Timestamp reported for locations that were never fetched
pub const NEVER: i64 = 0;

const KEY_PREFIX: &str = "last-update-";

/// Storage key for a location's freshness record
pub fn record_key(location: &str) -> String {
    format!("{KEY_PREFIX}{location}")
}

/// Persisted location -> last-download-time mapping
///
/// Neither method fails from the caller's point of view: reads degrade to
/// [`NEVER`] and write failures are logged and dropped, so a broken cache can
/// cost a redundant download but never abort one.
pub trait FreshnessCache: Send + Sync {
    /// Last successful download time for `location` in epoch ms, or [`NEVER`]
    fn get(&self, location: &str) -> i64;

    /// Record a successful download of `location` at `timestamp_ms`
    fn set(&self, location: &str, timestamp_ms: i64);
}
