//! Admin notifications.
//!
//! Notifications are created by server events (new account, new course) and
//! shown to admins. Read notifications are removed by the cleanup task once
//! they are older than the retention window.

use learnhub_storage::Document;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Notification status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub status: NotificationStatus,
    /// Subject the notification is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Notification {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            status: NotificationStatus::Unread,
            user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn about(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Marks the notification read, keeping the update time.
    #[must_use]
    pub fn mark_read(mut self, now: OffsetDateTime) -> Self {
        self.status = NotificationStatus::Read;
        self.updated_at = now;
        self
    }

    /// `true` if read and last touched before `cutoff`.
    #[must_use]
    pub fn is_expired(&self, cutoff: OffsetDateTime) -> bool {
        self.status == NotificationStatus::Read && self.updated_at < cutoff
    }
}

impl Document for Notification {
    const COLLECTION: &'static str = "notifications";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_only_read_notifications_expire() {
        let created = datetime!(2026-01-01 0:00 UTC);
        let cutoff = datetime!(2026-02-01 0:00 UTC);

        let unread = Notification::new("New Order", "Someone ordered", created);
        assert!(!unread.is_expired(cutoff));

        let read = unread.clone().mark_read(created);
        assert!(read.is_expired(cutoff));

        let recently_read = unread.mark_read(datetime!(2026-02-02 0:00 UTC));
        assert!(!recently_read.is_expired(cutoff));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let n = Notification::new("t", "m", datetime!(2026-01-01 0:00 UTC)).about("u1");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["status"], "unread");
        assert_eq!(json["user_id"], "u1");
    }
}
