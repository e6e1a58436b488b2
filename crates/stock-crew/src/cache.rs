//! Caching layer so repeated tool calls in one run do not refetch

use cached::{Cached, TimedCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Thread-safe cache with a fixed time-to-live per entry
///
/// Clones share the same storage.
pub struct StockCache<V> {
    name: &'static str,
    cache: Arc<RwLock<TimedCache<String, V>>>,
}

impl<V: Clone> StockCache<V> {
    /// Create a new cache with specified TTL
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        // TimedCache evicts expired entries on read, so reads need the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key.into(), value);
    }

    /// Return the cached value or run `fetcher` and cache its success
    ///
    /// Errors are never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(cache = self.name, key, "Cache hit");
            return Ok(value);
        }

        debug!(cache = self.name, key, "Cache miss");
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for StockCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<V> std::fmt::Debug for StockCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockCache").field("name", &self.name).finish_non_exhaustive()
    }
}
