//! Short-lived response caching to stay inside provider quotas

use crate::config::MarketConfig;
use cached::{Cached, TimedCache};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for one provider request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub capability: String,
    /// Validated arguments, serialized
    pub args: String,
}

impl CacheKey {
    pub fn new(capability: impl Into<String>, args: &impl Serialize) -> Self {
        Self {
            capability: capability.into(),
            args: serde_json::to_string(args).unwrap_or_default(),
        }
    }
}

/// Thread-safe TTL cache of normalized capability results
#[derive(Clone)]
pub struct ResponseCache {
    cache: Arc<RwLock<TimedCache<CacheKey, Value>>>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, value: Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value or run `fetcher` and cache its success
    ///
    /// Failures are never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(capability = %key.capability, "Cache hit");
            return Ok(value);
        }

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

/// Caches grouped by how fast the underlying data changes
#[derive(Debug, Clone)]
pub struct CacheManager {
    pub realtime: ResponseCache,
    pub reference: ResponseCache,
    pub news: ResponseCache,
}

impl CacheManager {
    pub fn new(realtime_ttl: Duration, reference_ttl: Duration, news_ttl: Duration) -> Self {
        Self {
            realtime: ResponseCache::new(realtime_ttl),
            reference: ResponseCache::new(reference_ttl),
            news: ResponseCache::new(news_ttl),
        }
    }

    pub fn from_config(config: &MarketConfig) -> Self {
        Self::new(
            config.cache_ttl_realtime,
            config.cache_ttl_reference,
            config.cache_ttl_news,
        )
    }
}
