use crate::client::HttpSource;
use crate::config::LoaderConfig;
use crate::handle::{ChartDataHandle, ChartDataState};
use crate::pending::PendingRequests;
use benchviz_cache::{CacheStore, ChartDataCache};
use benchviz_core::ports::DataSource;
use benchviz_core::{Error, Result, SchemaKind, ValidatedPayload};
use benchviz_validate::Validator;
use futures::FutureExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Per-call loading options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Read and write the cache and share in-flight requests. When off,
    /// every call performs its own fetch.
    pub enable_cache: bool,
    /// Schema the fetched document must satisfy.
    pub schema: SchemaKind,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            enable_cache: true,
            schema: SchemaKind::Chart,
        }
    }
}

impl LoadOptions {
    pub fn benchmark() -> Self {
        Self {
            schema: SchemaKind::Benchmark,
            ..Self::default()
        }
    }

    pub fn without_cache(self) -> Self {
        Self {
            enable_cache: false,
            ..self
        }
    }
}

/// Loads, validates, caches and deduplicates chart data.
///
/// Cloning is cheap; clones share the cache and the in-flight table.
#[derive(Clone)]
pub struct ChartDataLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    config: LoaderConfig,
    source: Arc<dyn DataSource>,
    cache: ChartDataCache,
    validator: Validator,
    pending: Arc<PendingRequests<Arc<ValidatedPayload>>>,
}

impl ChartDataLoader {
    pub fn new(
        config: LoaderConfig,
        source: Arc<dyn DataSource>,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        let validator = Validator::new().map_err(|e| Error::Internal(e.to_string()))?;
        Self::with_validator(config, source, store, validator)
    }

    /// Loader that fetches over HTTP.
    pub fn http(config: LoaderConfig, store: Arc<dyn CacheStore>) -> Result<Self> {
        Self::new(config, Arc::new(HttpSource::new()), store)
    }

    pub fn with_validator(
        config: LoaderConfig,
        source: Arc<dyn DataSource>,
        store: Arc<dyn CacheStore>,
        validator: Validator,
    ) -> Result<Self> {
        config.validate()?;
        let cache = ChartDataCache::new(store, config.cache_ttl());
        Ok(Self {
            inner: Arc::new(LoaderInner {
                config,
                source,
                cache,
                validator,
                pending: PendingRequests::new(),
            }),
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &ChartDataCache {
        &self.inner.cache
    }

    /// Load the document at `path`.
    ///
    /// With caching enabled a fresh cache entry is returned without any
    /// network access, and concurrent callers for the same path share one
    /// fetch and its outcome.
    pub async fn load(&self, path: &str, options: LoadOptions) -> Result<Arc<ValidatedPayload>> {
        if !options.enable_cache {
            return self.inner.fetch_validated(path, options.schema, false).await;
        }

        if let Some(payload) = self.inner.cached(path, options.schema) {
            return Ok(payload);
        }

        let (load, started) = self.inner.pending.attach_or_start(path, || {
            let inner = Arc::clone(&self.inner);
            let path = path.to_string();
            async move { inner.fetch_validated(&path, options.schema, true).await }.boxed()
        });
        if started {
            debug!(path, schema = %options.schema, "Started chart data request");
        }

        // The shared request may have been started under another schema.
        let payload = load.await?;
        if payload.kind() == options.schema {
            return Ok(payload);
        }
        self.inner
            .revalidate(payload.value(), options.schema)
            .map(Arc::new)
    }

    /// Start an observable activation for `path`.
    ///
    /// A fresh cache hit settles the handle immediately. Otherwise the load
    /// runs on a spawned task, so this must be called inside a tokio runtime.
    pub fn watch(&self, path: &str, options: LoadOptions) -> ChartDataHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        if options.enable_cache
            && let Some(payload) = self.inner.cached(path, options.schema)
        {
            let (_, state_rx) = watch::channel(ChartDataState::done(payload));
            return ChartDataHandle::new(path.to_string(), state_rx, cancel_tx);
        }

        let (state_tx, state_rx) = watch::channel(ChartDataState::loading());
        let loader = self.clone();
        let owned_path = path.to_string();
        tokio::spawn(async move {
            loader
                .drive(owned_path, options, state_tx, cancel_rx)
                .await;
        });

        ChartDataHandle::new(path.to_string(), state_rx, cancel_tx)
    }

    async fn drive(
        &self,
        path: String,
        options: LoadOptions,
        state_tx: watch::Sender<ChartDataState>,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let outcome = tokio::select! {
            outcome = self.load(&path, options) => outcome,
            _ = cancelled(&mut cancel_rx) => {
                debug!(path = %path, "Chart data activation cancelled");
                return;
            }
        };

        if *cancel_rx.borrow() {
            debug!(path = %path, "Discarding result for cancelled activation");
            return;
        }

        let next = match outcome {
            Ok(payload) => ChartDataState::done(payload),
            Err(e) => ChartDataState::failed(e.to_string()),
        };
        let _ = state_tx.send(next);
    }

    /// Remove one path from the cache, or every namespaced entry when `path`
    /// is `None`. In-flight requests are not affected.
    pub fn clear_cache(&self, path: Option<&str>) {
        match path {
            Some(path) => self.inner.cache.clear(path),
            None => {
                let removed = self.inner.cache.clear_all();
                info!(removed, "Cleared chart data cache");
            }
        }
    }
}

impl std::fmt::Debug for ChartDataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartDataLoader")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache)
            .field("in_flight", &self.inner.pending.len())
            .finish()
    }
}

impl LoaderInner {
    fn revalidate(&self, value: &Value, schema: SchemaKind) -> Result<ValidatedPayload> {
        self.validator.validate(schema, value).into_payload(schema)
    }

    /// Fresh cache entry for `path`, re-validated against `schema`.
    fn cached(&self, path: &str, schema: SchemaKind) -> Option<Arc<ValidatedPayload>> {
        let value = self.cache.read(path)?;
        match self.revalidate(&value, schema) {
            Ok(payload) => {
                debug!(path, "Serving chart data from cache");
                Some(Arc::new(payload))
            }
            Err(e) => {
                warn!(path, schema = %schema, error = %e, "Cached data failed validation, refetching");
                self.cache.clear(path);
                None
            }
        }
    }

    async fn fetch_validated(
        &self,
        path: &str,
        schema: SchemaKind,
        write_cache: bool,
    ) -> Result<Arc<ValidatedPayload>> {
        let result = self.fetch_validated_inner(path, schema, write_cache).await;
        if let Err(e) = &result {
            warn!(path, schema = %schema, error = %e, "Failed to load chart data");
        }
        result
    }

    async fn fetch_validated_inner(
        &self,
        path: &str,
        schema: SchemaKind,
        write_cache: bool,
    ) -> Result<Arc<ValidatedPayload>> {
        let url = self.config.data_url(path);
        let timeout = self.config.request_timeout();

        let body = tokio::time::timeout(
            timeout,
            self.source.fetch(&url, self.config.max_content_length),
        )
        .await
        .map_err(|_| Error::Timeout {
            millis: timeout.as_millis() as u64,
        })??;

        let raw: Value = serde_json::from_slice(&body)?;
        let payload = self.validator.validate(schema, &raw).into_payload(schema)?;

        if write_cache {
            self.cache.write(path, payload.value());
        }

        info!(path, url = %url, bytes = body.len(), schema = %schema, "Loaded chart data");
        Ok(Arc::new(payload))
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        // A dropped handle counts as cancellation.
        if rx.changed().await.is_err() {
            return;
        }
    }
}
