use std::collections::HashMap;
use std::sync::Mutex;

use super::{FreshnessCache, NEVER};

/// Process-local freshness cache
#[derive(Debug, Default)]
pub struct MemoryFreshnessCache {
    records: Mutex<HashMap<String, i64>>,
}

impl MemoryFreshnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, e.g. to simulate an earlier run
    pub fn with_record(self, location: &str, timestamp_ms: i64) -> Self {
        self.set(location, timestamp_ms);
        self
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FreshnessCache for MemoryFreshnessCache {
    fn get(&self, location: &str) -> i64 {
        match self.records.lock() {
            Ok(records) => records.get(location).copied().unwrap_or(NEVER),
            Err(_) => NEVER,
        }
    }

    fn set(&self, location: &str, timestamp_ms: i64) {
        match self.records.lock() {
            Ok(mut records) => {
                records.insert(location.to_string(), timestamp_ms);
            }
            Err(_) => tracing::warn!(location, "Freshness cache lock poisoned, record dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_absent_location_is_never() {
        let cache = MemoryFreshnessCache::new();
        assert_eq!(cache.get("http://x/a"), NEVER);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let cache = MemoryFreshnessCache::new().with_record("http://x/a", 100);
        cache.set("http://x/a", 250);

        assert_eq!(cache.get("http://x/a"), 250);
        assert_eq!(cache.get("http://x/b"), NEVER);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_a_whole_value() {
        let cache = Arc::new(MemoryFreshnessCache::new());

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set("http://x/shared", i * 1000);
                        let seen = cache.get("http://x/shared");
                        assert!(seen % 1000 == 0 && (1000..=8000).contains(&seen));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
