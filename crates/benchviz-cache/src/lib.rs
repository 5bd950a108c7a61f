//! Client-side cache for validated chart data.
//!
//! Entries live in a key/value [`CacheStore`] under the `chart-data-cache-`
//! namespace, encoded as `{"timestamp": <ms>, "data": {...}}`, and expire
//! after a TTL (24 hours by default).

pub mod cache;
pub mod keys;
pub mod provider;
pub mod types;

pub use cache::{ChartDataCache, DEFAULT_TTL};
pub use keys::{CACHE_NAMESPACE, cache_key, matches_prefix, path_from_key};
pub use provider::{CacheStore, FilesystemStore, MemoryStore};
pub use types::{CacheEntry, CacheStats};
