//! Orders. One is stored per enrollment; payment itself is not processed.

use learnhub_storage::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub course_id: String,
    pub user_id: String,
    /// Whatever the client sent as payment details, stored as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Order {
    #[must_use]
    pub fn new(
        course_id: impl Into<String>,
        user_id: impl Into<String>,
        payment_info: Option<Value>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course_id.into(),
            user_id: user_id.into(),
            payment_info,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &str {
        &self.id
    }
}
