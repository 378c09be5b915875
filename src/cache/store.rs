use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tracing::{debug, info, warn};

use super::error::{CacheError, Result};
use super::{FreshnessCache, NEVER, record_key};

/// Fjall-backed freshness cache
///
/// Layout: a single `freshness` partition, `last-update-<location>` → i64
/// epoch milliseconds (big-endian). Every write is followed by a keyspace
/// persist so a record survives process death once `set` returns.
#[derive(Clone)]
pub struct FjallFreshnessCache {
    keyspace: Keyspace,
    records: PartitionHandle,
}

impl FjallFreshnessCache {
    /// Open or create the cache at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening freshness cache at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let records = keyspace.open_partition("freshness", PartitionCreateOptions::default())?;

        Ok(Self { keyspace, records })
    }

    /// Read a record, surfacing storage errors
    pub fn try_get(&self, location: &str) -> Result<Option<i64>> {
        let key = record_key(location);
        match self.records.get(key.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    CacheError::CorruptRecord {
                        key: key.clone(),
                        len: bytes.len(),
                    }
                })?;
                Ok(Some(i64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    /// Write and persist a record, surfacing storage errors
    pub fn try_set(&self, location: &str, timestamp_ms: i64) -> Result<()> {
        let key = record_key(location);
        self.records.insert(key.as_bytes(), timestamp_ms.to_be_bytes())?;
        self.keyspace.persist(PersistMode::SyncData)?;
        debug!(location, timestamp_ms, "Freshness record stored");
        Ok(())
    }

    /// Number of stored records (for inspection)
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.records.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl FreshnessCache for FjallFreshnessCache {
    fn get(&self, location: &str) -> i64 {
        match self.try_get(location) {
            Ok(timestamp) => timestamp.unwrap_or(NEVER),
            Err(e) => {
                warn!(location, error = %e, "Freshness lookup failed, treating chunk as never fetched");
                NEVER
            }
        }
    }

    fn set(&self, location: &str, timestamp_ms: i64) {
        if let Err(e) = self.try_set(location, timestamp_ms) {
            warn!(location, error = %e, "Failed to write freshness record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (FjallFreshnessCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = FjallFreshnessCache::open(temp_dir.path().join("freshness")).unwrap();
        (cache, temp_dir)
    }

    #[test]
    fn test_missing_record_is_never() {
        let (cache, _temp) = create_test_cache();
        assert_eq!(cache.try_get("http://x/a").unwrap(), None);
        assert_eq!(cache.get("http://x/a"), NEVER);
    }

    #[test]
    fn test_set_then_get() {
        let (cache, _temp) = create_test_cache();

        cache.set("http://x/a", 1_700_000_000_000);
        cache.set("http://x/a", 1_700_000_000_500);
        cache.set("http://x/b", 42);

        assert_eq!(cache.get("http://x/a"), 1_700_000_000_500);
        assert_eq!(cache.get("http://x/b"), 42);
        assert_eq!(cache.len().unwrap(), 2);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("freshness");

        {
            let cache = FjallFreshnessCache::open(&path).unwrap();
            cache.set("http://x/a", 123_456);
        }

        let cache = FjallFreshnessCache::open(&path).unwrap();
        assert_eq!(cache.get("http://x/a"), 123_456);
    }

    #[test]
    fn test_corrupt_record_reads_as_never() {
        let (cache, _temp) = create_test_cache();
        let key = record_key("http://x/a");
        cache
            .records
            .insert(key.as_bytes(), b"oops".as_slice())
            .unwrap();

        assert!(matches!(
            cache.try_get("http://x/a"),
            Err(CacheError::CorruptRecord { len: 4, .. })
        ));
        assert_eq!(cache.get("http://x/a"), NEVER);
    }
}
