//! Read-through catalog cache.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use learnhub_kv::DynKv;

use crate::schema::{self, CachePayload};
use crate::{CacheError, CacheKey};

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub decode_failures: u64,
    pub store_failures: u64,
}

impl CacheStats {
    /// Returns the hit rate as a value between 0.0 and 1.0.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    decode_failures: AtomicU64,
    store_failures: AtomicU64,
}

/// Read-through cache over the shared key-value store.
///
/// Store failures on the read path degrade to a miss: the caller always gets
/// a value from `populate`, just without the cache's help.
#[derive(Clone)]
pub struct CatalogCache {
    kv: DynKv,
    resource_ttl: Duration,
    counters: Arc<Counters>,
}

impl CatalogCache {
    /// Creates a cache. `resource_ttl` applies to per-course keys only.
    #[must_use]
    pub fn new(kv: DynKv, resource_ttl: Duration) -> Self {
        Self {
            kv,
            resource_ttl,
            counters: Arc::new(Counters::default()),
        }
    }

    /// TTL used when storing under `key`. `None` for the aggregate key.
    #[must_use]
    pub fn ttl_for(&self, key: &CacheKey) -> Option<Duration> {
        if key.is_aggregate() {
            None
        } else {
            Some(self.resource_ttl)
        }
    }

    /// Returns the cached value for `key`, or calls `populate`, stores its
    /// result and returns it.
    ///
    /// On a hit `populate` is not called. Cache failures are logged and
    /// treated as a miss.
    ///
    /// # Errors
    ///
    /// Only errors returned by `populate` are propagated.
    pub async fn get_or_populate<T, E, F, Fut>(&self, key: &CacheKey, populate: F) -> Result<T, E>
    where
        T: CachePayload,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.lookup::<T>(key).await {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("cache_hits_total").increment(1);
                tracing::trace!(key = %key, "Cache hit");
                return Ok(value);
            }
            Err(CacheError::Miss { .. }) => {}
            Err(e @ CacheError::Decode { .. }) => {
                self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                if let Err(e) = self.invalidate(key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to drop undecodable entry");
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, reading from source");
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cache_misses_total").increment(1);

        let value = populate().await?;
        if let Err(e) = self.store(key, &value).await {
            self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key = %key, error = %e, "Failed to populate cache");
        }
        Ok(value)
    }

    /// Reads and decodes `key`.
    ///
    /// # Errors
    ///
    /// - `CacheError::Miss` if there is no entry
    /// - `CacheError::Decode` if the entry does not decode as `T`
    /// - `CacheError::Unavailable` if the store is unreachable
    pub async fn lookup<T: CachePayload>(&self, key: &CacheKey) -> Result<T, CacheError> {
        let raw_key = key.to_key();
        let bytes = self
            .kv
            .get(&raw_key)
            .await?
            .ok_or_else(|| CacheError::miss(raw_key.as_str()))?;
        schema::decode(&raw_key, &bytes)
    }

    /// Encodes and writes `value` under `key` with the key's TTL.
    ///
    /// # Errors
    ///
    /// `CacheError::Encode` or `CacheError::Unavailable`.
    pub async fn store<T: CachePayload>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError> {
        let raw_key = key.to_key();
        let bytes = schema::encode(&raw_key, value)?;
        self.kv.set(&raw_key, bytes, self.ttl_for(key)).await?;
        Ok(())
    }

    /// Deletes the entry for `key`. Deleting a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// `CacheError::Unavailable` if the store is unreachable.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        let removed = self.kv.delete(&key.to_key()).await?;
        tracing::debug!(key = %key, removed, "Cache entry invalidated");
        Ok(())
    }

    /// Returns hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            decode_failures: self.counters.decode_failures.load(Ordering::Relaxed),
            store_failures: self.counters.store_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FlakyKv;
    use crate::{CachedCourse, CachedCourseList};
    use learnhub_kv::{KeyValueStore, MemoryKv};
    use std::convert::Infallible;
    use std::sync::atomic::AtomicUsize;

    fn cached(id: &str, name: &str) -> CachedCourse {
        CachedCourse {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price: 0.0,
            estimated_price: None,
            thumbnail: None,
            tags: String::new(),
            level: String::new(),
            demo_url: String::new(),
            benefits: vec![],
            prerequisites: vec![],
            ratings: 0.0,
            purchased: 0,
            reviews: vec![],
            sections: vec![],
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn cache() -> (CatalogCache, Arc<MemoryKv>) {
        let kv = Arc::new(MemoryKv::new());
        (CatalogCache::new(kv.clone(), Duration::from_secs(60)), kv)
    }

    #[tokio::test]
    async fn test_populate_called_at_most_once() {
        let (cache, _) = cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let key = CacheKey::course("1");

        let populate = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(cached("1", "Rust"))
        };

        let first = cache.get_or_populate(&key, populate).await.unwrap();
        let second = cache.get_or_populate(&key, populate).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_repopulate() {
        let (cache, _) = cache();
        let key = CacheKey::course("1");

        cache
            .get_or_populate(&key, || async { Ok::<_, Infallible>(cached("1", "Old")) })
            .await
            .unwrap();
        cache.invalidate(&key).await.unwrap();

        let value = cache
            .get_or_populate(&key, || async { Ok::<_, Infallible>(cached("1", "New")) })
            .await
            .unwrap();
        assert_eq!(value.name, "New");
    }

    #[tokio::test]
    async fn test_invalidate_missing_key_is_noop() {
        let (cache, _) = cache();
        assert!(cache.invalidate(&CacheKey::AllCourses).await.is_ok());
    }

    #[tokio::test]
    async fn test_populate_error_propagates_and_nothing_stored() {
        let (cache, kv) = cache();
        let key = CacheKey::course("1");

        let result: Result<CachedCourse, &str> =
            cache.get_or_populate(&key, || async { Err("db down") }).await;
        assert_eq!(result.unwrap_err(), "db down");
        assert!(kv.get("course:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_aggregate_stored_without_ttl() {
        let (cache, _) = cache();
        assert_eq!(cache.ttl_for(&CacheKey::AllCourses), None);
        assert_eq!(
            cache.ttl_for(&CacheKey::course("1")),
            Some(Duration::from_secs(60))
        );
    }

    #[tokio::test]
    async fn test_per_resource_entry_expires() {
        let kv = Arc::new(MemoryKv::new());
        let cache = CatalogCache::new(kv, Duration::from_millis(10));
        let key = CacheKey::course("1");
        cache.store(&key, &cached("1", "Rust")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(matches!(
            cache.lookup::<CachedCourse>(&key).await,
            Err(CacheError::Miss { .. })
        ));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let (cache, kv) = cache();
        kv.set("allCourses", b"legacy json".to_vec(), None)
            .await
            .unwrap();

        let list = cache
            .get_or_populate(&CacheKey::AllCourses, || async {
                Ok::<_, Infallible>(CachedCourseList {
                    courses: vec![cached("1", "Rust")],
                })
            })
            .await
            .unwrap();

        assert_eq!(list.courses.len(), 1);
        assert_eq!(cache.stats().decode_failures, 1);
        assert!(cache.lookup::<CachedCourseList>(&CacheKey::AllCourses).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_outage_degrades_to_source_read() {
        let kv = Arc::new(FlakyKv::new());
        kv.set_unavailable(true);
        let cache = CatalogCache::new(kv, Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let value = cache
                .get_or_populate(&CacheKey::course("1"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(cached("1", "Rust"))
                })
                .await
                .unwrap();
            assert_eq!(value.name, "Rust");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().store_failures, 2);
    }
}
