use async_trait::async_trait;
use benchviz_core::ports::DataSource;
use benchviz_core::{Error, Result};
use reqwest::Client;
use tracing::debug;

/// [`DataSource`] backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>> {
        let mut res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        // Declared length is checked before the status and before any body read.
        if let Some(size) = res.content_length()
            && size > max_bytes
        {
            return Err(Error::SizeLimit {
                size,
                max: max_bytes,
            });
        }

        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        // Chunked responses carry no length, so the ceiling is also enforced while reading.
        let mut body = Vec::new();
        while let Some(chunk) = res
            .chunk()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(Error::SizeLimit {
                    size,
                    max: max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "Fetched response body");
        Ok(body)
    }
}
