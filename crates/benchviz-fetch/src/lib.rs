//! Chart-data loading for benchviz.
//!
//! [`ChartDataLoader`] resolves a logical data path to a URL, fetches it,
//! enforces the response-size ceiling, validates the JSON, caches it with a
//! TTL, and makes concurrent callers for the same path share one request.
//!
//! ```rust,ignore
//! use benchviz_fetch::{ChartDataLoader, LoadOptions, LoaderConfig};
//!
//! let loader = ChartDataLoader::http(LoaderConfig::default(), store)?;
//! let mut handle = loader.watch("/benchmarks/atlas-4096.json", LoadOptions::benchmark());
//! let state = handle.wait().await;
//! ```

pub mod client;
pub mod config;
pub mod handle;
pub mod loader;
pub mod pending;

pub use client::HttpSource;
pub use config::LoaderConfig;
pub use handle::{ChartDataHandle, ChartDataState};
pub use loader::{ChartDataLoader, LoadOptions};
pub use pending::PendingRequests;
