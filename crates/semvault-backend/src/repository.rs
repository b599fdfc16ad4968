//! Model repository.
//!
//! Front door of the persistence layer: routes each call to one of its named
//! [`PersistenceStrategy`] instances, optionally consults a [`ModelCache`]
//! on loads, and applies two-tier concurrency control.
//!
//! Concurrency model: every operation first takes a permit from a global
//! semaphore (bounding total in-flight storage work), then the mutex for its
//! storage path (serializing work on one model). Release order is the
//! reverse, path lock before permit.
//!
//! The cache is best-effort: a failing cache operation is logged and the
//! call proceeds against storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use semvault_core::security::validate_and_sanitize_path;
use semvault_core::SemanticModel;

use crate::cache::{CacheStatistics, ModelCache};
use crate::error::BackendError;
use crate::keys::cache_key;
use crate::traits::PersistenceStrategy;

/// Default bound on concurrent storage operations.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-call load behavior. The default is the cheapest load: eager, no
/// tracking, straight to storage.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Defer entity collection reads until first access.
    pub lazy: bool,
    /// Attach a change tracker to the loaded model.
    pub tracking: bool,
    /// Consult and populate the repository's cache.
    pub caching: bool,
    /// Route to a named strategy instead of the default.
    pub strategy: Option<String>,
}

impl LoadOptions {
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn tracked(mut self) -> Self {
        self.tracking = true;
        self
    }

    pub fn cached(mut self) -> Self {
        self.caching = true;
        self
    }

    pub fn via(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

/// Holds both tiers of the lock for one operation.
///
/// Field order matters: the path guard drops before the global permit.
struct OperationLock {
    _path: OwnedMutexGuard<()>,
    _global: OwnedSemaphorePermit,
}

/// Builder for [`ModelRepository`].
pub struct ModelRepositoryBuilder {
    strategies: HashMap<String, Arc<dyn PersistenceStrategy>>,
    default_strategy: Option<String>,
    cache: Option<Arc<dyn ModelCache>>,
    max_concurrency: usize,
    allow_extended_paths: bool,
}

impl ModelRepositoryBuilder {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            default_strategy: None,
            cache: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            allow_extended_paths: false,
        }
    }

    /// Register a strategy under its own name. The first registered strategy
    /// becomes the default unless [`default_strategy`](Self::default_strategy)
    /// overrides it.
    pub fn strategy(mut self, strategy: Arc<dyn PersistenceStrategy>) -> Self {
        let name = strategy.strategy_name().to_string();
        if self.default_strategy.is_none() {
            self.default_strategy = Some(name.clone());
        }
        self.strategies.insert(name, strategy);
        self
    }

    pub fn default_strategy(mut self, name: impl Into<String>) -> Self {
        self.default_strategy = Some(name.into());
        self
    }

    pub fn cache(mut self, cache: Arc<dyn ModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn allow_extended_paths(mut self, allow: bool) -> Self {
        self.allow_extended_paths = allow;
        self
    }

    pub fn build(self) -> Result<ModelRepository, BackendError> {
        let default_strategy = self.default_strategy.ok_or_else(|| {
            BackendError::with_context("building repository", "no persistence strategy registered")
        })?;
        if !self.strategies.contains_key(&default_strategy) {
            return Err(BackendError::with_context(
                "building repository",
                format!("default strategy '{default_strategy}' is not registered"),
            ));
        }
        Ok(ModelRepository {
            strategies: self.strategies,
            default_strategy,
            cache: self.cache,
            allow_extended_paths: self.allow_extended_paths,
            global: Arc::new(Semaphore::new(self.max_concurrency)),
            path_locks: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        })
    }
}

impl Default for ModelRepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrency-controlled access to stored models.
pub struct ModelRepository {
    strategies: HashMap<String, Arc<dyn PersistenceStrategy>>,
    default_strategy: String,
    cache: Option<Arc<dyn ModelCache>>,
    allow_extended_paths: bool,
    global: Arc<Semaphore>,
    /// One mutex per distinct sanitized path. Entries are never removed; the
    /// map grows with the set of distinct paths touched over the
    /// repository's lifetime.
    path_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    disposed: AtomicBool,
}

impl ModelRepository {
    /// Repository with a single strategy, no cache, and default concurrency.
    pub fn new(strategy: Arc<dyn PersistenceStrategy>) -> Self {
        let name = strategy.strategy_name().to_string();
        let mut strategies = HashMap::new();
        strategies.insert(name.clone(), strategy);
        Self {
            strategies,
            default_strategy: name,
            cache: None,
            allow_extended_paths: false,
            global: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
            path_locks: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn builder() -> ModelRepositoryBuilder {
        ModelRepositoryBuilder::new()
    }

    fn ensure_live(&self) -> Result<(), BackendError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(BackendError::RepositoryDisposed);
        }
        Ok(())
    }

    fn resolve_strategy(
        &self,
        name: Option<&str>,
    ) -> Result<&Arc<dyn PersistenceStrategy>, BackendError> {
        let name = name.unwrap_or(&self.default_strategy);
        self.strategies.get(name).ok_or_else(|| {
            BackendError::with_context(
                "resolving strategy",
                format!("no strategy registered under '{name}'"),
            )
        })
    }

    fn sanitize(&self, path: &Path) -> Result<PathBuf, BackendError> {
        Ok(validate_and_sanitize_path(path, self.allow_extended_paths)?)
    }

    /// Acquire the global permit, then the per-path mutex.
    async fn lock(&self, path: &Path) -> Result<OperationLock, BackendError> {
        let global = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BackendError::RepositoryDisposed)?;
        let key = path.to_string_lossy().into_owned();
        let mutex = self
            .path_locks
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let path = mutex.lock_owned().await;
        Ok(OperationLock {
            _path: path,
            _global: global,
        })
    }

    fn cache_lookup_key(&self, path: &Path, strategy: &dyn PersistenceStrategy) -> String {
        cache_key(path, strategy.strategy_name())
    }

    async fn cache_get(&self, key: &str) -> Option<Arc<SemanticModel>> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, model: Arc<SemanticModel>) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(key, model, None).await {
                warn!(key, error = %e, "cache insert failed");
            }
        }
    }

    async fn cache_drop(&self, key: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.remove(key).await {
                warn!(key, error = %e, "cache removal failed");
            }
        }
    }

    /// Persist the full model at `path`.
    ///
    /// Saves go straight to the strategy; the cache is never consulted or
    /// updated here, so a cached stale copy is only replaced by a later
    /// caching load.
    pub async fn save_model(
        &self,
        model: &SemanticModel,
        path: &Path,
        strategy: Option<&str>,
    ) -> Result<(), BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(strategy)?.clone();
        let path = self.sanitize(path)?;
        let _lock = self.lock(&path).await?;

        strategy.save_model(model, &path).await
    }

    /// Persist the model and mark its tracked changes as accepted.
    ///
    /// The whole model is written; tracking determines acceptance, not the
    /// write set. The tracker is cleared only after the save succeeded, so a
    /// failed save keeps every dirty entity dirty.
    pub async fn save_changes(
        &self,
        model: &SemanticModel,
        path: &Path,
        strategy: Option<&str>,
    ) -> Result<usize, BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(strategy)?.clone();
        let path = self.sanitize(path)?;
        let _lock = self.lock(&path).await?;

        let pending = model
            .change_tracker()
            .map(|tracker| tracker.dirty_count())
            .unwrap_or(0);
        strategy.save_model(model, &path).await?;
        if let Some(tracker) = model.change_tracker() {
            tracker.clear();
        }
        Ok(pending)
    }

    /// Load the model stored at `path`.
    ///
    /// A cache hit returns the cached instance, attaching a change tracker
    /// when `tracking` is set. `lazy` only shapes loads that reach the
    /// strategy; cached models already have their collections materialized,
    /// so the option has no effect on a hit.
    pub async fn load_model(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Arc<SemanticModel>, BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(options.strategy.as_deref())?.clone();
        let path = self.sanitize(path)?;
        let key = self.cache_lookup_key(&path, strategy.as_ref());

        if options.caching {
            if let Some(model) = self.cache_get(&key).await {
                debug!(path = %path.display(), "cache hit");
                if options.tracking {
                    model.enable_change_tracking();
                }
                return Ok(model);
            }
        }

        let _lock = self.lock(&path).await?;

        // A concurrent load may have filled the cache while we waited.
        if options.caching {
            if let Some(model) = self.cache_get(&key).await {
                if options.tracking {
                    model.enable_change_tracking();
                }
                return Ok(model);
            }
        }

        let model = if options.lazy {
            strategy.load_model_lazy(&path).await?
        } else {
            strategy.load_model(&path).await?
        };
        if options.tracking {
            model.enable_change_tracking();
        }
        if options.caching {
            self.cache_put(&key, model.clone()).await;
        }
        Ok(model)
    }

    /// Check whether a model is stored at `path`. Always asks the strategy;
    /// a cached copy is no proof the stored model still exists.
    pub async fn exists(&self, path: &Path, strategy: Option<&str>) -> Result<bool, BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(strategy)?.clone();
        let path = self.sanitize(path)?;
        let _lock = self.lock(&path).await?;
        strategy.exists(&path).await
    }

    /// Delete the model stored at `path` and drop its cache entry.
    ///
    /// # Returns
    /// `true` if a model was deleted; deleting a missing model returns
    /// `false` without error.
    pub async fn delete_model(
        &self,
        path: &Path,
        strategy: Option<&str>,
    ) -> Result<bool, BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(strategy)?.clone();
        let path = self.sanitize(path)?;
        let key = self.cache_lookup_key(&path, strategy.as_ref());
        let _lock = self.lock(&path).await?;

        let deleted = strategy.delete_model(&path).await?;
        self.cache_drop(&key).await;
        Ok(deleted)
    }

    /// List models stored under `root`.
    pub async fn list_models(
        &self,
        root: &Path,
        strategy: Option<&str>,
    ) -> Result<Vec<String>, BackendError> {
        self.ensure_live()?;
        let strategy = self.resolve_strategy(strategy)?.clone();
        let root = self.sanitize(root)?;
        let _global = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BackendError::RepositoryDisposed)?;
        strategy.list_models(&root).await
    }

    /// Drop one model from the cache without touching storage.
    pub async fn invalidate(
        &self,
        path: &Path,
        strategy: Option<&str>,
    ) -> Result<bool, BackendError> {
        let strategy = self.resolve_strategy(strategy)?.clone();
        let path = self.sanitize(path)?;
        let key = self.cache_lookup_key(&path, strategy.as_ref());
        match &self.cache {
            Some(cache) => cache.remove(&key).await,
            None => Ok(false),
        }
    }

    /// Counters of the attached cache, or `None` without one.
    pub async fn cache_statistics(&self) -> Result<Option<CacheStatistics>, BackendError> {
        match &self.cache {
            Some(cache) => Ok(Some(cache.statistics().await?)),
            None => Ok(None),
        }
    }

    /// Shut the repository down. Idempotent; in-flight operations finish,
    /// every later call fails with [`BackendError::RepositoryDisposed`].
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.global.close();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ModelRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModelRepository")
            .field("strategies", &names)
            .field("default_strategy", &self.default_strategy)
            .field("cached", &self.cache.is_some())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
