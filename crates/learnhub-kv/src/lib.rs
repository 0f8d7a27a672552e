//! # learnhub-kv
//!
//! Key-value store abstraction shared by the session store and the catalog
//! cache.
//!
//! ## Backends
//!
//! - [`MemoryKv`]: in-process `DashMap` with per-entry expiry. Used for
//!   single-instance deployments and tests.
//! - [`RedisKv`]: Redis through a `deadpool-redis` pool. Used when several
//!   server instances must see the same sessions and cache entries.
//!
//! ## Graceful Degradation
//!
//! [`create_kv_store`] falls back to [`MemoryKv`] when Redis is disabled or
//! unreachable at startup, so the server can run without it.
//!
//! Handles are passed explicitly to the components that use them; there is
//! no process-wide store.

mod config;
mod error;
mod memory;
mod redis_store;
mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use config::RedisConfig;
pub use error::KvError;
pub use memory::{KvStats, MemoryKv};
pub use redis_store::RedisKv;
pub use traits::KeyValueStore;

/// Type alias for key-value store results.
pub type KvResult<T> = Result<T, KvError>;

/// Shared key-value store handle.
pub type DynKv = Arc<dyn KeyValueStore>;

/// Create a key-value store based on configuration.
///
/// ## Store Modes
///
/// - **Redis disabled**: Returns an in-process store
/// - **Redis enabled**: Connects to Redis, falls back to in-process on failure
pub async fn create_kv_store(config: &RedisConfig) -> DynKv {
    if !config.enabled {
        tracing::info!("Redis disabled, using in-process key-value store");
        return Arc::new(MemoryKv::new());
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let timeout = Duration::from_millis(config.timeout_ms);
    let pool_config = redis_config
        .pool
        .get_or_insert_with(|| deadpool_redis::PoolConfig::new(config.pool_size));
    pool_config.max_size = config.pool_size;
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to in-process store."
            );
            return Arc::new(MemoryKv::new());
        }
    };

    let store = RedisKv::new(pool);
    match store.ping().await {
        Ok(()) => {
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to in-process store."
            );
            Arc::new(MemoryKv::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_redis_uses_memory() {
        let store = create_kv_store(&RedisConfig::default()).await;
        assert_eq!(store.mode(), "memory");
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let config = RedisConfig {
            enabled: true,
            url: "redis://127.0.0.1:1".to_string(),
            pool_size: 1,
            timeout_ms: 200,
        };
        let store = create_kv_store(&config).await;
        assert_eq!(store.mode(), "memory");
    }
}
