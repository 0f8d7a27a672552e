//! Scheduled cleanup of old records.
//!
//! Runs on its own timer, independent of requests. It reaches the data only
//! through the document store and key-value store handles it is given.

use std::sync::Arc;
use std::time::Duration;

use learnhub_auth::Clock;
use learnhub_kv::DynKv;
use learnhub_storage::{DocumentStore, DynCollection, StorageError};
use tokio::task::JoinHandle;

use crate::metrics::record_cleanup_run;
use crate::notification::Notification;

/// Outcome of one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Read notifications past retention that were deleted.
    pub notifications_deleted: usize,
    /// Expired entries evicted from the in-process key-value backend.
    pub kv_evicted: usize,
    /// Deletions that failed and will be retried next run.
    pub failures: usize,
}

pub struct CleanupTask {
    notifications: DynCollection<Notification>,
    kv: DynKv,
    clock: Arc<dyn Clock>,
    interval: Duration,
    retention: Duration,
}

impl CleanupTask {
    #[must_use]
    pub fn new(
        notifications: DynCollection<Notification>,
        kv: DynKv,
        clock: Arc<dyn Clock>,
        interval: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            notifications,
            kv,
            clock,
            interval,
            retention,
        }
    }

    /// Runs one pass. A failed lookup aborts the notification part only.
    pub async fn run_once(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.delete_expired_notifications(&mut report).await {
            Ok(()) => {}
            Err(e) => {
                report.failures += 1;
                tracing::warn!(error = %e, "Notification cleanup failed");
            }
        }

        report.kv_evicted = self.kv.cleanup_expired();
        report
    }

    async fn delete_expired_notifications(
        &self,
        report: &mut CleanupReport,
    ) -> Result<(), StorageError> {
        let cutoff = self.clock.now() - self.retention;
        let expired = self
            .notifications
            .find(&|n: &Notification| n.is_expired(cutoff))
            .await?;

        for notification in expired {
            match self.notifications.delete_by_id(&notification.id).await {
                Ok(_) => report.notifications_deleted += 1,
                // Deleted concurrently, nothing left to do
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(id = %notification.id, error = %e, "Failed to delete notification");
                }
            }
        }
        Ok(())
    }

    /// Spawns the cleanup loop. The first run happens one interval after
    /// startup.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                retention_secs = self.retention.as_secs(),
                "Cleanup task started"
            );

            loop {
                ticker.tick().await;
                let report = self.run_once().await;
                let outcome = if report.failures == 0 { "ok" } else { "partial" };
                record_cleanup_run(outcome, report.notifications_deleted + report.kv_evicted);
                tracing::info!(
                    notifications_deleted = report.notifications_deleted,
                    kv_evicted = report.kv_evicted,
                    failures = report.failures,
                    "Cleanup run finished"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use learnhub_auth::ManualClock;
    use learnhub_kv::{KeyValueStore, MemoryKv};
    use learnhub_storage::{MemoryCollection, Predicate, StorageResult};
    use time::macros::datetime;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn task(
        notifications: DynCollection<Notification>,
        kv: DynKv,
        clock: Arc<ManualClock>,
    ) -> CleanupTask {
        CleanupTask::new(notifications, kv, clock, Duration::from_secs(60), 30 * DAY)
    }

    #[tokio::test]
    async fn test_deletes_only_old_read_notifications() {
        let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 0:00 UTC)));
        let store: Arc<MemoryCollection<Notification>> = Arc::new(MemoryCollection::new());

        let start = clock.now();
        let old_read = store
            .create(Notification::new("old", "read", start).mark_read(start))
            .await
            .unwrap();
        let old_unread = store
            .create(Notification::new("old", "unread", start))
            .await
            .unwrap();

        clock.advance(time::Duration::days(40));
        let fresh_read = store
            .create(Notification::new("new", "read", clock.now()).mark_read(clock.now()))
            .await
            .unwrap();

        let report = task(store.clone(), Arc::new(MemoryKv::new()), clock)
            .run_once()
            .await;

        assert_eq!(report.notifications_deleted, 1);
        assert_eq!(report.failures, 0);
        assert!(store.find_by_id(&old_read.id).await.unwrap().is_none());
        assert!(store.find_by_id(&old_unread.id).await.unwrap().is_some());
        assert!(store.find_by_id(&fresh_read.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_evicts_expired_kv_entries() {
        let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 0:00 UTC)));
        let kv = Arc::new(MemoryKv::new());
        kv.set("short", b"x".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        kv.set("long", b"y".to_vec(), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let report = task(Arc::new(MemoryCollection::new()), kv.clone(), clock)
            .run_once()
            .await;

        assert_eq!(report.kv_evicted, 1);
        assert!(kv.get("long").await.unwrap().is_some());
    }

    struct BrokenNotifications;

    #[async_trait]
    impl DocumentStore<Notification> for BrokenNotifications {
        async fn find_by_id(&self, _id: &str) -> StorageResult<Option<Notification>> {
            Err(StorageError::connection_error("down"))
        }
        async fn find(&self, _predicate: Predicate<'_, Notification>) -> StorageResult<Vec<Notification>> {
            Err(StorageError::connection_error("down"))
        }
        async fn create(&self, _document: Notification) -> StorageResult<Notification> {
            Err(StorageError::connection_error("down"))
        }
        async fn update_by_id(&self, _id: &str, _document: Notification) -> StorageResult<Notification> {
            Err(StorageError::connection_error("down"))
        }
        async fn delete_by_id(&self, _id: &str) -> StorageResult<Notification> {
            Err(StorageError::connection_error("down"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_not_raised() {
        let clock = Arc::new(ManualClock::new(datetime!(2026-01-01 0:00 UTC)));
        let kv = Arc::new(MemoryKv::new());
        kv.set("gone", b"x".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let report = task(Arc::new(BrokenNotifications), kv, clock).run_once().await;

        assert_eq!(report.failures, 1);
        assert_eq!(report.notifications_deleted, 0);
        // The key-value part still runs
        assert_eq!(report.kv_evicted, 1);
    }
}
