//! Port traits.
//!
//! These traits define the interfaces between the chart-data pipeline and
//! the outside world.

use crate::Result;
use async_trait::async_trait;

/// Retrieves raw dataset bodies.
///
/// Implementations must reject a response whose declared length exceeds
/// `max_bytes` before reading its body, and must map non-success statuses to
/// [`crate::Error::HttpStatus`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the body at `url`.
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>>;
}
