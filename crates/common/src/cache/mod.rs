//! In-process TTL cache
//!
//! A passive read-through memo used in front of exactly one external call:
//! the bestseller overview fetch. Entries expire after a fixed TTL and are
//! never invalidated early; staleness up to the TTL is acceptable by
//! design. Must not front anything with correctness implications (review
//! or list data is never cached).

use crate::errors::Result;
use crate::metrics;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// Keyed TTL cache with a single fixed expiry
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
    ttl: Duration,
    name: &'static str,
}

impl<T: Clone> TtlCache<T> {
    /// Create a cache with the given TTL; `name` labels cache metrics
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            name,
        }
    }

    /// Get a fresh value, if one is cached
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let hit = entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone());

        metrics::record_cache(hit.is_some(), self.name);
        if hit.is_some() {
            debug!(cache = self.name, key, "Cache hit");
        } else {
            debug!(cache = self.name, key, "Cache miss");
        }
        hit
    }

    /// Store a value, restarting its TTL
    pub async fn put(&self, key: &str, value: T) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Get a fresh value or load and cache one
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let value = loader().await?;
        self.put(key, value.clone()).await;
        Ok(value)
    }
}

/// Cache key for the bestseller overview feed
pub const FEED_KEY: &str = "books:feed";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache: TtlCache<String> = TtlCache::new("test", Duration::from_secs(60));
        assert!(cache.get("k").await.is_none());

        cache.put("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache: TtlCache<String> = TtlCache::new("test", Duration::from_millis(10));
        cache.put("k", "v".to_string()).await;

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_load_caches_loaded_value() {
        let cache: TtlCache<u32> = TtlCache::new("test", Duration::from_secs(60));

        let loaded = cache.get_or_load("k", || async { Ok(42) }).await.unwrap();
        assert_eq!(loaded, 42);

        // Second load must not run: the loader would fail
        let cached = cache
            .get_or_load("k", || async {
                Err(AppError::Internal {
                    message: "loader should not run".into(),
                })
            })
            .await
            .unwrap();
        assert_eq!(cached, 42);
    }

    #[tokio::test]
    async fn test_load_failure_is_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new("test", Duration::from_secs(60));

        let result: Result<u32> = cache
            .get_or_load("k", || async {
                Err(AppError::Internal {
                    message: "upstream down".into(),
                })
            })
            .await;
        assert!(result.is_err());
        assert!(cache.get("k").await.is_none());
    }
}
