//! Model cache contract and in-memory implementation.
//!
//! The repository treats the cache as a best-effort optimization: every
//! operation is fallible so remote caches can be plugged in, and the
//! repository logs and swallows any failure instead of surfacing it.
//!
//! [`MemoryModelCache`] is the bundled implementation: an LRU of loaded
//! models with optional time-to-live expiry and hit/miss statistics.
//! Thread-safe via interior mutability using parking_lot::Mutex.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use semvault_core::SemanticModel;

use crate::error::BackendError;

/// Default maximum number of cached models.
pub const DEFAULT_CAPACITY: usize = 32;

/// Rough per-model overhead used for the memory estimate.
const BASE_MODEL_BYTES: u64 = 4 * 1024;
/// Rough per-entity cost used for the memory estimate.
const BYTES_PER_ENTITY: u64 = 2 * 1024;

/// Cache of fully materialized models, keyed by
/// [`cache_key`](crate::keys::cache_key) output.
///
/// Implementations must be safe for concurrent access. A `get` may hand the
/// same `Arc<SemanticModel>` to multiple callers; concurrent mutators of a
/// cached model are not isolated from each other.
#[async_trait]
pub trait ModelCache: Send + Sync {
    /// Look up a model.
    async fn get(&self, key: &str) -> Result<Option<Arc<SemanticModel>>, BackendError>;

    /// Insert or replace a model. `ttl` overrides the implementation's
    /// default expiry for this entry.
    async fn set(
        &self,
        key: &str,
        model: Arc<SemanticModel>,
        ttl: Option<Duration>,
    ) -> Result<(), BackendError>;

    /// Remove one entry. Returns whether it was present.
    async fn remove(&self, key: &str) -> Result<bool, BackendError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), BackendError>;

    /// Whether a live entry exists for `key`, without counting a hit.
    async fn exists(&self, key: &str) -> Result<bool, BackendError>;

    /// Current counters.
    async fn statistics(&self) -> Result<CacheStatistics, BackendError>;
}

/// Snapshot of cache counters.
///
/// When statistics collection is disabled every counter reads zero; `size`
/// and `memory_estimate` stay informational and real.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub memory_estimate: u64,
}

impl CacheStatistics {
    /// Hit rate in the range 0.0 - 1.0.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }
}

struct CacheEntry {
    model: Arc<SemanticModel>,
    expires_at: Option<Instant>,
    estimated_bytes: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() > at)
    }
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// In-memory LRU model cache with optional TTL.
pub struct MemoryModelCache {
    default_ttl: Option<Duration>,
    statistics_enabled: bool,
    state: Mutex<CacheState>,
}

impl MemoryModelCache {
    pub fn new(capacity: usize, default_ttl: Option<Duration>, statistics_enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            default_ttl,
            statistics_enabled,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY, None, true)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset_statistics(&self) {
        let mut state = self.state.lock();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
        state.expirations = 0;
    }
}

impl Default for MemoryModelCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl ModelCache for MemoryModelCache {
    async fn get(&self, key: &str) -> Result<Option<Arc<SemanticModel>>, BackendError> {
        let mut state = self.state.lock();
        let state = &mut *state;

        match state.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                state.hits += 1;
                return Ok(Some(entry.model.clone()));
            }
            Some(_) => {}
            None => {
                state.misses += 1;
                return Ok(None);
            }
        }

        // Expired entry: drop it and count the expiry as a miss.
        state.entries.pop(key);
        state.expirations += 1;
        state.misses += 1;
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        model: Arc<SemanticModel>,
        ttl: Option<Duration>,
    ) -> Result<(), BackendError> {
        // A lazy model would have to hit storage to count its entities, so
        // only materialized collections feed the estimate.
        let entity_count = if model.is_lazy() {
            0
        } else {
            model.entity_count().await.unwrap_or(0)
        };
        let entry = CacheEntry {
            model,
            expires_at: ttl
                .or(self.default_ttl)
                .map(|ttl| Instant::now() + ttl),
            estimated_bytes: BASE_MODEL_BYTES + entity_count as u64 * BYTES_PER_ENTITY,
        };

        let mut state = self.state.lock();
        let state = &mut *state;
        let evicted = state.entries.push(key.to_string(), entry);
        // push() hands back either the overwritten entry (same key) or the
        // LRU victim; only the latter counts as an eviction.
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                state.evictions += 1;
            }
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, BackendError> {
        Ok(self.state.lock().entries.pop(key).is_some())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.state.lock().entries.clear();
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, BackendError> {
        let state = self.state.lock();
        Ok(state
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn statistics(&self) -> Result<CacheStatistics, BackendError> {
        let state = self.state.lock();
        let size = state.entries.len();
        let memory_estimate = state
            .entries
            .iter()
            .map(|(_, entry)| entry.estimated_bytes)
            .sum();
        if !self.statistics_enabled {
            return Ok(CacheStatistics {
                size,
                memory_estimate,
                ..CacheStatistics::default()
            });
        }
        Ok(CacheStatistics {
            total_requests: state.hits + state.misses,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            size,
            memory_estimate,
        })
    }
}
