use std::time::Duration;

use async_trait::async_trait;

use crate::KvResult;

/// Shared key-value store contract.
///
/// Each call is a single key operation and is assumed atomic at the store
/// level. Multi-step sequences built on top of it (read then write, write
/// then invalidate) are not transactional.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is missing or its TTL has elapsed.
    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// With `ttl = None` the entry never expires.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvResult<()>;

    /// Deletes `key`. Returns `true` if an entry was removed.
    ///
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> KvResult<bool>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> KvResult<()>;

    /// Short backend name for logs and health output.
    fn mode(&self) -> &'static str;

    /// Removes expired entries eagerly.
    ///
    /// Backends with native expiry (Redis) return 0.
    fn cleanup_expired(&self) -> usize {
        0
    }
}
