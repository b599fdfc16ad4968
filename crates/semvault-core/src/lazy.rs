//! Deferred, memoized loading of one entity collection.
//!
//! A [`LazyEntityList`] wraps a loader closure and materializes it at most
//! once: concurrent first reads are collapsed into a single load (single
//! flight), later reads return the memoized collection without touching the
//! loader again. A failed load leaves the list unloaded so the next read
//! retries.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Loader closure producing the full collection for one entity kind.
pub type EntityLoader<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<Arc<T>>, LazyError>> + Send + Sync>;

/// Errors raised by deferred loading.
#[derive(Debug, Error)]
pub enum LazyError {
    #[error("deferred load failed: {message}")]
    Load { message: String },
}

impl LazyError {
    pub fn load(message: impl Into<String>) -> Self {
        LazyError::Load {
            message: message.into(),
        }
    }
}

/// A lazily loaded, shared entity collection.
///
/// The memoized collection is an `Arc<Vec<Arc<T>>>` snapshot; callers get a
/// cheap clone of it and never observe a partially loaded state.
pub struct LazyEntityList<T> {
    loader: EntityLoader<T>,
    loaded: Mutex<Option<Arc<Vec<Arc<T>>>>>,
    /// Serializes first loads so the loader runs at most once per miss.
    gate: tokio::sync::Mutex<()>,
}

impl<T> LazyEntityList<T> {
    pub fn new(loader: EntityLoader<T>) -> Self {
        Self {
            loader,
            loaded: Mutex::new(None),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether the collection has been materialized.
    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// Get the collection, loading it on first access.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; the list stays unloaded so a later
    /// call retries.
    pub async fn get(&self) -> Result<Arc<Vec<Arc<T>>>, LazyError> {
        if let Some(items) = self.loaded.lock().clone() {
            return Ok(items);
        }

        let _guard = self.gate.lock().await;

        // Another task may have finished the load while we waited.
        if let Some(items) = self.loaded.lock().clone() {
            return Ok(items);
        }

        let items = Arc::new((self.loader)().await?);
        debug!(count = items.len(), "lazy collection materialized");
        *self.loaded.lock() = Some(items.clone());
        Ok(items)
    }

    /// Drop the memoized collection so the next read reloads.
    pub fn invalidate(&self) {
        *self.loaded.lock() = None;
    }
}

impl<T> std::fmt::Debug for LazyEntityList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyEntityList")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(
        counter: Arc<AtomicUsize>,
        items: Vec<Arc<String>>,
    ) -> EntityLoader<String> {
        Arc::new(move || {
            let counter = counter.clone();
            let items = items.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(items)
            })
        })
    }

    #[tokio::test]
    async fn test_loads_once_and_memoizes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let list = LazyEntityList::new(counting_loader(
            calls.clone(),
            vec![Arc::new("a".to_string()), Arc::new("b".to_string())],
        ));

        assert!(!list.is_loaded());
        let first = list.get().await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(list.is_loaded());

        let second = list.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_single_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slow_loader: EntityLoader<String> = {
            let calls = calls.clone();
            Arc::new(move || {
                let calls = calls.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    Ok(vec![Arc::new("x".to_string())])
                })
            })
        };
        let list = Arc::new(LazyEntityList::new(slow_loader));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let list = list.clone();
            handles.push(tokio::spawn(async move { list.get().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky: EntityLoader<String> = {
            let calls = calls.clone();
            Arc::new(move || {
                let calls = calls.clone();
                Box::pin(async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(LazyError::load("storage offline"))
                    } else {
                        Ok(vec![Arc::new("x".to_string())])
                    }
                })
            })
        };
        let list = LazyEntityList::new(flaky);

        assert!(list.get().await.is_err());
        assert!(!list.is_loaded());

        let items = list.get().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_reloads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let list = LazyEntityList::new(counting_loader(
            calls.clone(),
            vec![Arc::new("a".to_string())],
        ));

        list.get().await.unwrap();
        list.invalidate();
        assert!(!list.is_loaded());

        list.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
