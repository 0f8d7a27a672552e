use serde::{Deserialize, Serialize};

/// Current session record layout version.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Identity fields copied from the user record at login or refresh.
///
/// May be stale relative to the user directory until the next
/// [`SessionService::sync`](super::SessionService::sync) or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub course_ids: Vec<String>,
}

/// Value stored under the subject id in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Layout version, always [`SESSION_SCHEMA_VERSION`] when written.
    pub v: u32,
    pub subject_id: String,
    /// Bumped on every login and refresh. Only enforced under
    /// [`RotationPolicy::Strict`](crate::RotationPolicy::Strict).
    pub generation: u64,
    pub snapshot: IdentitySnapshot,
}

impl SessionRecord {
    /// Creates a record at the current layout version.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, generation: u64, snapshot: IdentitySnapshot) -> Self {
        Self {
            v: SESSION_SCHEMA_VERSION,
            subject_id: subject_id.into(),
            generation,
            snapshot,
        }
    }

    /// Same subject and generation, new snapshot.
    #[must_use]
    pub fn with_snapshot(&self, snapshot: IdentitySnapshot) -> Self {
        Self::new(self.subject_id.clone(), self.generation, snapshot)
    }
}
