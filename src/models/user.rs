use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An ordinary user.
    #[postgres(name = "user")]
    User,
    /// An administrator.
    #[postgres(name = "admin")]
    Admin,
}

/// Represents a user account as stored by the credential store.
///
/// The session core reads this record but never mutates it.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user. Assigned at creation, never reused.
    pub id: i64,
    /// The user's unique username.
    pub username: String,
    /// The user's unique email address.
    pub email: String,
    /// The user's hashed password.
    pub password_hash: String,
    /// The user's role.
    pub role: Role,
    /// Whether the user is active.
    pub is_active: bool,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The public projection of a user: every field except the password hash.
/// This is the only user shape that leaves a handler.
#[derive(Clone, Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
