//! Invalidation after writes: retry with backoff, a ledger of keys that
//! could not be invalidated, and the sweep that drains it.
//!
//! A write to the document store and the matching cache invalidation are
//! not atomic. The primary write always commits first; invalidation is then
//! an obligation that is retried until it succeeds or is handed to the
//! [`ReconciliationSweep`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::{CacheError, CacheKey, CatalogCache};

/// Exponential backoff for invalidation retries.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. At least 1.
    pub max_attempts: u32,

    /// Delay before the second attempt. Doubles for each later attempt.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Upper bound for a single delay.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
struct PendingEntry {
    first_failed_at: Instant,
    attempts: u32,
    last_error: String,
    /// Changes on every `record`, so a clear can tell whether a newer
    /// failure landed while its delete was in flight.
    seq: u64,
}

/// Position of a pending entry, taken before an invalidation attempt and
/// handed back to [`PendingInvalidations::clear_if_unchanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMark(Option<u64>);

/// Keys whose invalidation exhausted its retries.
///
/// Shared between request handlers (which add to it) and the sweep (which
/// drains it).
#[derive(Clone, Default)]
pub struct PendingInvalidations {
    entries: Arc<DashMap<CacheKey, PendingEntry>>,
    next_seq: Arc<AtomicU64>,
}

impl PendingInvalidations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed invalidation of `key`. Repeated failures for one key
    /// keep a single entry.
    pub fn record(&self, key: CacheKey, attempts: u32, error: &CacheError) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries
            .entry(key)
            .and_modify(|entry| {
                entry.attempts = entry.attempts.saturating_add(attempts);
                entry.last_error = error.to_string();
                entry.seq = seq;
            })
            .or_insert_with(|| PendingEntry {
                first_failed_at: Instant::now(),
                attempts,
                last_error: error.to_string(),
                seq,
            });
    }

    /// Marks the current state of `key`. Take the mark before deleting the
    /// key from the cache.
    #[must_use]
    pub fn mark(&self, key: &CacheKey) -> PendingMark {
        PendingMark(self.entries.get(key).map(|e| e.seq))
    }

    /// Removes `key` if nothing was recorded for it since `mark` was taken.
    ///
    /// A failure recorded after the mark belongs to a write the delete may
    /// not have covered, so that entry stays for the sweep.
    pub fn clear_if_unchanged(&self, key: &CacheKey, mark: PendingMark) -> bool {
        let PendingMark(Some(seq)) = mark else {
            return false;
        };
        self.entries
            .remove_if(key, |_, entry| entry.seq == seq)
            .is_some()
    }

    /// Returns `true` if `key` is pending.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Up to `limit` pending keys, oldest failure first.
    #[must_use]
    pub fn oldest(&self, limit: usize) -> Vec<CacheKey> {
        let mut keys: Vec<(Instant, CacheKey)> = self
            .entries
            .iter()
            .map(|e| (e.value().first_failed_at, e.key().clone()))
            .collect();
        keys.sort_by_key(|(at, _)| *at);
        keys.into_iter().take(limit).map(|(_, key)| key).collect()
    }

    /// Total attempts spent on `key` so far.
    #[must_use]
    pub fn attempts(&self, key: &CacheKey) -> Option<u32> {
        self.entries.get(key).map(|e| e.attempts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of invalidating a set of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub invalidated: Vec<CacheKey>,
    /// Keys handed to the pending ledger.
    pub deferred: Vec<CacheKey>,
}

impl InvalidationReport {
    /// Returns `true` if every key was invalidated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.deferred.is_empty()
    }
}

/// Invalidates cache keys with retries and records what still fails.
#[derive(Clone)]
pub struct Invalidator {
    cache: CatalogCache,
    policy: RetryPolicy,
    pending: PendingInvalidations,
}

impl Invalidator {
    #[must_use]
    pub fn new(cache: CatalogCache, policy: RetryPolicy, pending: PendingInvalidations) -> Self {
        Self {
            cache,
            policy,
            pending,
        }
    }

    /// Returns the pending ledger.
    #[must_use]
    pub fn pending(&self) -> &PendingInvalidations {
        &self.pending
    }

    /// Invalidates every key in `keys`. Never fails: keys that exhaust their
    /// retries are recorded as pending.
    pub async fn invalidate_all(&self, keys: &[CacheKey]) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        for key in keys {
            let mark = self.pending.mark(key);
            match self.invalidate_with_retry(key).await {
                Ok(()) => {
                    self.pending.clear_if_unchanged(key, mark);
                    report.invalidated.push(key.clone());
                }
                Err((attempts, e)) => {
                    tracing::error!(
                        key = %key,
                        attempts,
                        error = %e,
                        "Cache invalidation failed, deferring to reconciliation"
                    );
                    metrics::counter!("cache_invalidations_total", "outcome" => "deferred")
                        .increment(1);
                    self.pending.record(key.clone(), attempts, &e);
                    report.deferred.push(key.clone());
                }
            }
        }
        report
    }

    async fn invalidate_with_retry(&self, key: &CacheKey) -> Result<(), (u32, CacheError)> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.cache.invalidate(key).await {
                Ok(()) => {
                    let outcome = if attempt == 1 { "ok" } else { "retried" };
                    metrics::counter!("cache_invalidations_total", "outcome" => outcome)
                        .increment(1);
                    return Ok(());
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Cache invalidation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }

    /// One attempt per key, no backoff. Used by the sweep.
    async fn invalidate_once(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.cache.invalidate(key).await
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub cleared: usize,
    pub still_pending: usize,
}

/// Background task retrying pending invalidations.
///
/// Shares nothing with request handlers beyond the cache handle and the
/// pending ledger. A failing sweep is logged and the next tick runs as usual.
pub struct ReconciliationSweep {
    invalidator: Invalidator,
    interval: Duration,
    batch_size: usize,
}

impl ReconciliationSweep {
    #[must_use]
    pub fn new(invalidator: Invalidator, interval: Duration, batch_size: usize) -> Self {
        Self {
            invalidator,
            interval,
            batch_size: batch_size.max(1),
        }
    }

    /// Retries at most `batch_size` pending keys, oldest first.
    pub async fn run_once(&self) -> SweepReport {
        let pending = self.invalidator.pending();
        let batch = pending.oldest(self.batch_size);
        let mut report = SweepReport {
            attempted: batch.len(),
            ..SweepReport::default()
        };

        for key in batch {
            let mark = pending.mark(&key);
            match self.invalidator.invalidate_once(&key).await {
                Ok(()) if pending.clear_if_unchanged(&key, mark) => {
                    report.cleared += 1;
                    metrics::counter!("cache_invalidations_total", "outcome" => "reconciled")
                        .increment(1);
                    tracing::info!(key = %key, "Pending invalidation reconciled");
                }
                Ok(()) => {
                    tracing::debug!(key = %key, "Key failed again during the sweep, kept pending");
                }
                Err(e) => {
                    pending.record(key.clone(), 1, &e);
                    tracing::warn!(key = %key, error = %e, "Pending invalidation still failing");
                }
            }
        }

        report.still_pending = pending.len();
        report
    }

    /// Spawns the sweep loop.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                batch_size = self.batch_size,
                "Cache reconciliation sweep started"
            );

            loop {
                ticker.tick().await;
                if self.invalidator.pending().is_empty() {
                    continue;
                }
                let report = self.run_once().await;
                tracing::debug!(
                    attempted = report.attempted,
                    cleared = report.cleared,
                    still_pending = report.still_pending,
                    "Reconciliation sweep finished"
                );
            }
        })
    }
}
