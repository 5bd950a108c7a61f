//! Observable load state for one chart-data activation.

use benchviz_core::ValidatedPayload;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of an activation.
///
/// `data` and `error` are never both set, and neither is set while
/// `is_loading` is true.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataState {
    pub data: Option<Arc<ValidatedPayload>>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl ChartDataState {
    pub fn loading() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: true,
        }
    }

    pub fn done(data: Arc<ValidatedPayload>) -> Self {
        Self {
            data: Some(data),
            error: None,
            is_loading: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            is_loading: false,
        }
    }

    /// Whether the activation has reached `Done` or `Failed`.
    pub fn is_settled(&self) -> bool {
        !self.is_loading
    }
}

/// Handle to one activation started by [`crate::ChartDataLoader::watch`].
///
/// Dropping the handle cancels the activation. A cancelled activation never
/// publishes another state, though the request behind it may still finish
/// and fill the cache.
#[derive(Debug)]
pub struct ChartDataHandle {
    path: String,
    state_rx: watch::Receiver<ChartDataState>,
    cancel_tx: watch::Sender<bool>,
}

impl ChartDataHandle {
    pub(crate) fn new(
        path: String,
        state_rx: watch::Receiver<ChartDataState>,
        cancel_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            path,
            state_rx,
            cancel_tx,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current state.
    pub fn state(&self) -> ChartDataState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the next published state. Returns `false` once the
    /// activation can publish nothing more.
    pub async fn changed(&mut self) -> bool {
        self.state_rx.changed().await.is_ok()
    }

    /// Wait until the activation settles and return the final state.
    ///
    /// If the activation was cancelled before settling, the last published
    /// state (still loading) is returned.
    pub async fn wait(&mut self) -> ChartDataState {
        loop {
            {
                let state = self.state_rx.borrow_and_update();
                if state.is_settled() {
                    return state.clone();
                }
            }
            if self.state_rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Stop the activation from publishing further states.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

impl Drop for ChartDataHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchviz_core::SchemaKind;
    use serde_json::json;

    #[test]
    fn test_state_constructors() {
        let loading = ChartDataState::loading();
        assert!(loading.is_loading);
        assert!(loading.data.is_none() && loading.error.is_none());

        let payload = Arc::new(ValidatedPayload::new(SchemaKind::Chart, json!({"labels": []})));
        let done = ChartDataState::done(payload.clone());
        assert!(done.is_settled());
        assert_eq!(done.data, Some(payload));
        assert!(done.error.is_none());

        let failed = ChartDataState::failed("Request timed out after 10 ms");
        assert!(failed.is_settled());
        assert!(failed.data.is_none());
        assert_eq!(failed.error.as_deref(), Some("Request timed out after 10 ms"));
    }

    #[tokio::test]
    async fn test_wait_returns_settled_state() {
        let (state_tx, state_rx) = watch::channel(ChartDataState::loading());
        let (cancel_tx, _cancel_rx) = watch::channel(false);
        let mut handle = ChartDataHandle::new("/a.json".into(), state_rx, cancel_tx);

        tokio::spawn(async move {
            let _ = state_tx.send(ChartDataState::failed("boom"));
        });

        let state = handle.wait().await;
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_wait_after_publisher_gone() {
        let (state_tx, state_rx) = watch::channel(ChartDataState::loading());
        let (cancel_tx, _cancel_rx) = watch::channel(false);
        let mut handle = ChartDataHandle::new("/a.json".into(), state_rx, cancel_tx);
        drop(state_tx);

        let state = handle.wait().await;
        assert!(state.is_loading);
    }

    #[test]
    fn test_drop_signals_cancel() {
        let (_state_tx, state_rx) = watch::channel(ChartDataState::loading());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = ChartDataHandle::new("/a.json".into(), state_rx, cancel_tx);
        assert!(!handle.is_cancelled());

        drop(handle);
        assert!(*cancel_rx.borrow());
    }
}
