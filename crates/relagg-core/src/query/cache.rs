//! Cache of structurally resolved relationship paths.
//!
//! Structural resolution depends only on the immutable registry, so a
//! resolved path is valid for the registry's whole lifetime. Policy and
//! tenant predicates are never cached; they depend on the caller.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::catalog::RelationshipResolution;
use crate::error::Result;

type PathKey = (String, Vec<String>);

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Concurrent cache keyed by `(owner resource, relationship path)`.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: DashMap<PathKey, Arc<Vec<RelationshipResolution>>>,
    stats: CacheStats,
}

impl PathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached resolution of `path`, resolving it on a miss.
    ///
    /// Failed resolutions are not cached.
    pub fn get_or_resolve<F>(
        &self,
        owner: &str,
        path: &[String],
        resolve: F,
    ) -> Result<Arc<Vec<RelationshipResolution>>>
    where
        F: FnOnce() -> Result<Vec<RelationshipResolution>>,
    {
        let key = (owner.to_string(), path.to_vec());
        if let Some(hit) = self.entries.get(&key) {
            self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
            tracing::debug!(owner, path = %path.join("."), "path cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        let resolved = Arc::new(resolve()?);
        self.entries.insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached path.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
