//! TTL cache over a [`CacheStore`].

use crate::keys::{CACHE_NAMESPACE, cache_key, matches_prefix, path_from_key};
use crate::provider::CacheStore;
use crate::types::{CacheEntry, CacheStats};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default time-to-live: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Serialize)]
struct StoredEntry<'a> {
    timestamp: i64,
    data: &'a Value,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    expired: AtomicU64,
}

/// Chart-data cache.
///
/// Storage failures never escape: reads degrade to misses and writes are
/// best effort. Both are logged at `warn`.
pub struct ChartDataCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    counters: Counters,
}

impl ChartDataCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            counters: Counters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Fresh cached data for `path`, if any.
    pub fn read(&self, path: &str) -> Option<Value> {
        self.read_at(path, Self::now_ms())
    }

    fn read_at(&self, path: &str, now_ms: i64) -> Option<Value> {
        let key = cache_key(path);

        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Cache read failed, treating as miss");
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path, error = %e, "Discarding corrupt cache entry");
                self.remove_key(&key);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if !entry.is_fresh(now_ms, self.ttl_ms()) {
            debug!(path = %path, "Cache entry expired");
            self.remove_key(&key);
            self.counters.expired.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        debug!(path = %path, "Cache hit");
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.data)
    }

    /// Store `data` for `path`. Returns whether the write landed.
    pub fn write(&self, path: &str, data: &Value) -> bool {
        self.write_at(path, data, Self::now_ms())
    }

    fn write_at(&self, path: &str, data: &Value, now_ms: i64) -> bool {
        let entry = StoredEntry {
            timestamp: now_ms,
            data,
        };

        let result = serde_json::to_string(&entry)
            .map_err(benchviz_core::Error::from)
            .and_then(|encoded| self.store.set(&cache_key(path), &encoded));

        match result {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to cache chart data");
                self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Remove the entry for one path.
    pub fn clear(&self, path: &str) {
        self.remove_key(&cache_key(path));
    }

    /// Remove every entry in the namespace; other keys are left alone.
    ///
    /// Returns the number of entries removed.
    pub fn clear_all(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list cache keys");
                return 0;
            }
        };

        keys.iter()
            .filter(|key| matches_prefix(key, CACHE_NAMESPACE))
            .filter(|key| self.remove_key(key))
            .count()
    }

    /// Every readable entry in the namespace, keyed by logical path.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list cache keys");
                return vec![];
            }
        };

        let mut entries: Vec<_> = keys
            .iter()
            .filter_map(|key| {
                let path = path_from_key(key)?;
                let raw = self.store.get(key).ok().flatten()?;
                let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
                Some((path.to_string(), entry))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            write_failures: self.counters.write_failures.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
        }
    }

    fn remove_key(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove cache entry");
                false
            }
        }
    }
}

impl std::fmt::Debug for ChartDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartDataCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}
