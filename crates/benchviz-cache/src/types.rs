//! Cache entry and statistics types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached, already-validated payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the entry was written, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub data: Value,
}

impl CacheEntry {
    /// Age of the entry at `now_ms`, or `None` when the stored timestamp is
    /// in the future or too far out of range to subtract.
    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        now_ms.checked_sub(self.timestamp).filter(|age| *age >= 0)
    }

    /// Whether the entry is still inside its TTL at `now_ms`.
    ///
    /// Entries with an unusable timestamp are never fresh.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.age_ms(now_ms).is_some_and(|age| age < ttl_ms)
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub expired: u64,
}
