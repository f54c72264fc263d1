/*!
 * Expression Result Cache
 * Per-request memo of check outcomes
 *
 * One cache belongs to one request: the caller creates it, hands it to the
 * expression builder and drops it (or calls `clear`) when the request ends. It is
 * never shared between unrelated requests.
 */

use crate::core::limits::DEFAULT_RESULT_CACHE_CAPACITY;
use crate::permissions::checks::CheckId;
use crate::permissions::expression::ExpressionResult;
use crate::permissions::types::{ChangeId, ResourceIdentity};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Cache key for check outcomes
///
/// `resource` is absent for user checks and entity-level user-only decisions;
/// `change` is absent when no change descriptor was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Option<ResourceIdentity>,
    pub check: CheckId,
    pub change: Option<ChangeId>,
}

impl CacheKey {
    pub fn new(
        resource: Option<ResourceIdentity>,
        check: CheckId,
        change: Option<ChangeId>,
    ) -> Self {
        Self {
            resource,
            check,
            change,
        }
    }
}

/// Result cache with hit/miss accounting
///
/// # Performance
/// - Cache-line aligned to prevent false sharing of atomic hit/miss counters
#[repr(C, align(64))]
pub struct ExpressionResultCache {
    cache: DashMap<CacheKey, ExpressionResult, RandomState>,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExpressionResultCache {
    /// Create new cache
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: DashMap::with_capacity_and_hasher(max_size.min(64), RandomState::new()),
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cached outcome
    pub fn get(&self, key: &CacheKey) -> Option<ExpressionResult> {
        if let Some(entry) = self.cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(check = %key.check, "Check result cache hit");
            return Some(entry.value().clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store outcome
    pub fn put(&self, key: CacheKey, result: ExpressionResult) {
        // Size limit - remove an arbitrary entry if full
        if self.cache.len() >= self.max_size && !self.cache.contains_key(&key) {
            if let Some(entry) = self.cache.iter().next() {
                let evicted = entry.key().clone();
                drop(entry);
                self.cache.remove(&evicted);
            }
        }

        self.cache.insert(key, result);
    }

    /// Cached outcome for `key`, running `compute` at most once on a miss
    ///
    /// `compute` runs without any shard lock held.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> ExpressionResult
    where
        F: FnOnce() -> ExpressionResult,
    {
        if let Some(result) = self.get(&key) {
            return result;
        }

        let result = compute();
        trace!(check = %key.check, status = %result.status, "Check result cached");
        self.put(key, result.clone());
        result
    }

    /// Discard every cached outcome
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.cache.len(),
            max_size: self.max_size,
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Default for ExpressionResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ExpressionResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionResultCache")
            .field("size", &self.cache.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
