use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::session::IdentitySnapshot;

/// Role assigned to new accounts.
pub const DEFAULT_ROLE: &str = "user";

/// A user account as seen by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier. Used as the credential subject and session key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email, stored lowercase.
    pub email: String,
    /// Argon2 hash. `None` for accounts created through social login.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    /// Role name, "user" or "admin".
    pub role: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Ids of purchased courses.
    #[serde(default)]
    pub course_ids: Vec<String>,
    /// Whether the email address was verified.
    #[serde(default)]
    pub is_verified: bool,
    /// Account creation time.
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates a user with the default role and a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into().to_lowercase(),
            password_hash: None,
            role: DEFAULT_ROLE.to_string(),
            avatar: None,
            course_ids: Vec::new(),
            is_verified: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a new user builder.
    #[must_use]
    pub fn builder(name: impl Into<String>, email: impl Into<String>) -> UserBuilder {
        UserBuilder {
            user: Self::new(name, email),
        }
    }

    /// Returns `true` if the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Point-in-time copy of the fields the session store keeps.
    #[must_use]
    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            avatar: self.avatar.clone(),
            course_ids: self.course_ids.clone(),
        }
    }
}

impl learnhub_storage::Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Builder for creating `User` instances.
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    /// Sets the user ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.user.id = id.into();
        self
    }

    /// Sets the password hash.
    #[must_use]
    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.user.password_hash = Some(hash.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.user.role = role.into();
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.user.avatar = Some(avatar.into());
        self
    }

    /// Sets the purchased course ids.
    #[must_use]
    pub fn course_ids(mut self, ids: Vec<String>) -> Self {
        self.user.course_ids = ids;
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub fn created_at(mut self, at: OffsetDateTime) -> Self {
        self.user.created_at = at;
        self
    }

    /// Marks the email as verified.
    #[must_use]
    pub fn verified(mut self) -> Self {
        self.user.is_verified = true;
        self
    }

    /// Builds the user.
    #[must_use]
    pub fn build(self) -> User {
        self.user
    }
}

/// Lookup and creation of users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by id.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>>;

    /// Finds a user by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Stores a new user.
    async fn create(&self, user: User) -> AuthResult<User>;
}
