//! In-flight request table.
//!
//! Callers asking for a key that is already being loaded attach to the
//! running load instead of starting another one. Each load runs in its own
//! task, so it completes even if every caller stops waiting, and removes its
//! own entry when it finishes.

use benchviz_core::{Error, Result};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Future every caller for one key awaits.
pub type SharedLoad<T> = Shared<BoxFuture<'static, Result<T>>>;

struct Slot<T: Clone> {
    id: u64,
    load: SharedLoad<T>,
}

/// Map from key to the load currently producing its value.
pub struct PendingRequests<T: Clone> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for PendingRequests<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> PendingRequests<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        // Slots stay consistent across a panic, so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attach to the load in flight for `key`, or spawn the one `start` builds.
    ///
    /// Lookup and registration happen under one lock, so two callers can
    /// never both start a load for the same key. The flag is `true` when this
    /// call started the load. Must be called inside a tokio runtime.
    pub fn attach_or_start<F>(self: &Arc<Self>, key: &str, start: F) -> (SharedLoad<T>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<T>>,
    {
        let mut slots = self.lock();
        if let Some(slot) = slots.get(key) {
            debug!(key, "Attaching to in-flight request");
            return (slot.load.clone(), false);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let guard = SlotGuard {
            table: Arc::clone(self),
            key: key.to_string(),
            id,
        };
        let work = start();
        let task = tokio::spawn(async move {
            let _guard = guard;
            work.await
        });
        let load = async move {
            task.await
                .unwrap_or_else(|e| Err(Error::Internal(format!("load task failed: {}", e))))
        }
        .boxed()
        .shared();

        slots.insert(key.to_string(), Slot { id, load: load.clone() });
        (load, true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn finish(&self, key: &str, id: u64) {
        let mut slots = self.lock();
        // A newer load may already own the key.
        if slots.get(key).is_some_and(|slot| slot.id == id) {
            slots.remove(key);
        }
    }
}

/// Removes its slot when the load task ends, including by panic or abort.
struct SlotGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    table: Arc<PendingRequests<T>>,
    key: String,
    id: u64,
}

impl<T> Drop for SlotGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.table.finish(&self.key, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let table: Arc<PendingRequests<u32>> = PendingRequests::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let mut release_rx = Some(release_rx);

        let mut loads = Vec::new();
        for _ in 0..3 {
            let starts = Arc::clone(&starts);
            let rx = release_rx.take();
            let (load, _) = table.attach_or_start("/a.json", move || {
                starts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if let Some(rx) = rx {
                        let _ = rx.await;
                    }
                    Ok(7)
                }
                .boxed()
            });
            loads.push(load);
        }

        assert_eq!(table.len(), 1);
        release_tx.send(()).unwrap();

        let results = futures::future::join_all(loads).await;
        assert!(results.iter().all(|r| r == &Ok(7)));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_completion() {
        let table: Arc<PendingRequests<u32>> = PendingRequests::new();
        let (load, started) = table.attach_or_start("/a.json", || async { Ok(1) }.boxed());
        assert!(started);
        assert_eq!(load.await, Ok(1));
        assert!(table.is_empty());

        let (_, started) = table.attach_or_start("/a.json", || async { Ok(2) }.boxed());
        assert!(started);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_cleared() {
        let table: Arc<PendingRequests<u32>> = PendingRequests::new();
        let (first, _) = table.attach_or_start("/bad.json", || {
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(Error::Transport("connection refused".into()))
            }
            .boxed()
        });
        let (second, started) = table.attach_or_start("/bad.json", || async { Ok(0) }.boxed());
        assert!(!started);

        let expected = Err(Error::Transport("connection refused".into()));
        assert_eq!(first.await, expected);
        assert_eq!(second.await, expected);
    }

    #[tokio::test]
    async fn test_load_finishes_without_waiters() {
        let table: Arc<PendingRequests<u32>> = PendingRequests::new();
        let (done_tx, done_rx) = oneshot::channel();
        let (load, _) = table.attach_or_start("/a.json", move || {
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let _ = done_tx.send(());
                Ok(1)
            }
            .boxed()
        });
        drop(load);

        tokio::time::timeout(Duration::from_secs(1), done_rx)
            .await
            .expect("load should run to completion")
            .unwrap();
    }

    #[tokio::test]
    async fn test_panicking_load_reports_internal_error() {
        let table: Arc<PendingRequests<u32>> = PendingRequests::new();
        let (load, _) = table.attach_or_start("/boom.json", || {
            async {
                if true {
                    panic!("boom");
                }
                Ok(0)
            }
            .boxed()
        });

        assert!(matches!(load.await, Err(Error::Internal(_))));
        assert!(!table.contains("/boom.json"));
    }
}
