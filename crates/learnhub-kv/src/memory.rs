//! In-process key-value store with per-entry expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{KeyValueStore, KvResult};

/// Store statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct KvStats {
    /// Number of entries currently held (expired entries included until swept).
    pub size: usize,
    /// Number of reads that found a live entry.
    pub hits: u64,
    /// Number of reads that found nothing.
    pub misses: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub evictions: u64,
}

impl KvStats {
    /// Calculate hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug)]
struct StoredEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process store backed by `DashMap`.
///
/// Expired entries are dropped lazily on read and eagerly by
/// [`MemoryKv::cleanup_expired`], which the scheduled cleanup task calls.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, StoredEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryKv {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get store statistics.
    pub fn stats(&self) -> KvStats {
        KvStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Remove every entry whose TTL has elapsed.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.data.clone()));
            }
            // drop the read guard before removing, DashMap would deadlock otherwise
            drop(entry);
            // a concurrent set may have replaced the entry since the read
            if self
                .entries
                .remove_if(key, |_, entry| entry.is_expired(now))
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvResult<()> {
        let entry = StoredEntry {
            data: value,
            // a TTL past what Instant can represent means no expiry
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn ping(&self) -> KvResult<()> {
        Ok(())
    }

    fn mode(&self) -> &'static str {
        "memory"
    }

    fn cleanup_expired(&self) -> usize {
        MemoryKv::cleanup_expired(self)
    }
}
