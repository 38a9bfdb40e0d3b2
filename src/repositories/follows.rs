use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::user::PublicUser,
};

fn row_to_public_user(row: &Row) -> Result<PublicUser> {
    Ok(PublicUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Records that `follower_id` follows `followee_id`.
pub async fn follow(pool: &Pool, follower_id: i64, followee_id: i64) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            "#,
            &[&follower_id, &followee_id],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                AppError::Conflict("Already following this user".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    Ok(())
}

/// Removes a follow relationship. Returns `true` if a row was removed.
pub async fn unfollow(pool: &Pool, follower_id: i64, followee_id: i64) -> Result<bool> {
    let client = pool.get().await?;
    let removed = client
        .execute(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followee_id = $2
            "#,
            &[&follower_id, &followee_id],
        )
        .await?;
    Ok(removed > 0)
}

/// Lists the users following `user_id`.
pub async fn followers(pool: &Pool, user_id: i64) -> Result<Vec<PublicUser>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT u.id, u.username, u.email, u.role, u.is_active, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1 AND u.is_active = true
            ORDER BY f.created_at DESC
            "#,
            &[&user_id],
        )
        .await?;
    rows.iter().map(row_to_public_user).collect()
}

/// Lists the users that `user_id` follows.
pub async fn following(pool: &Pool, user_id: i64) -> Result<Vec<PublicUser>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT u.id, u.username, u.email, u.role, u.is_active, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1 AND u.is_active = true
            ORDER BY f.created_at DESC
            "#,
            &[&user_id],
        )
        .await?;
    rows.iter().map(row_to_public_user).collect()
}
