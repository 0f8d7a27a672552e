//! Catalog cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::invalidation::RetryPolicy;

/// Catalog cache configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [cache]
/// resource_ttl = "7d"
///
/// [cache.invalidation]
/// max_attempts = 5
/// base_delay = "50ms"
/// max_delay = "2s"
///
/// [cache.reconciliation]
/// interval = "30s"
/// batch_size = 100
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of per-course entries. The aggregate entry never expires.
    #[serde(with = "humantime_serde")]
    pub resource_ttl: Duration,

    /// Retry policy for invalidation after a write.
    pub invalidation: RetryPolicy,

    /// Background sweep over invalidations that exhausted their retries.
    pub reconciliation: ReconciliationConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resource_ttl: Duration::from_secs(7 * 24 * 3600),
            invalidation: RetryPolicy::default(),
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

/// Reconciliation sweep settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Run the sweep at all.
    pub enabled: bool,

    /// Time between sweeps.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Most pending keys retried per sweep.
    pub batch_size: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            batch_size: 100,
        }
    }
}
