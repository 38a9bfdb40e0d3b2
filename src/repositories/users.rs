use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Lookup interface the session core depends on. The store owns the user
/// record; the session core only ever reads it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds an active user whose username or email matches the identifier.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    /// Finds an active user by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Creates a new user.
///
/// A username or email collision surfaces as a conflict.
pub async fn create_user(
    pool: &Pool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, role, is_active, created_at, updated_at
            "#,
            &[&username, &email, &password_hash],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                AppError::Conflict("Username or email already taken".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    row_to_user(&row)
}

/// Finds an active user by username or email.
pub async fn find_by_identifier(pool: &Pool, identifier: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE (username = $1 OR email = $1) AND is_active = true
            "#,
            &[&identifier],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds an active user by ID.
pub async fn find_by_id(pool: &Pool, user_id: i64) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_active = true
            "#,
            &[&user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds an active user by exact username.
pub async fn find_by_username(pool: &Pool, username: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE username = $1 AND is_active = true
            "#,
            &[&username],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Deactivates a user. Returns `true` if a row was updated.
pub async fn deactivate(pool: &Pool, user_id: i64) -> Result<bool> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE users
            SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND is_active = true
            "#,
            &[&user_id],
        )
        .await?;
    Ok(updated > 0)
}

/// The PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: Pool,
}

impl PgCredentialStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        find_by_identifier(&self.pool, identifier).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        find_by_id(&self.pool, id).await
    }
}
