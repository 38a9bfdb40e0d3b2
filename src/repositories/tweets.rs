use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{error::Result, models::tweet::Tweet};

fn row_to_tweet(row: &Row) -> Result<Tweet> {
    Ok(Tweet {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Creates a new tweet.
pub async fn create_tweet(pool: &Pool, user_id: i64, content: &str) -> Result<Tweet> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            WITH t AS (
                INSERT INTO tweets (user_id, content)
                VALUES ($1, $2)
                RETURNING id, user_id, content, created_at
            )
            SELECT t.id, t.user_id, u.username, t.content, t.created_at
            FROM t
            JOIN users u ON u.id = t.user_id
            "#,
            &[&user_id, &content],
        )
        .await?;
    row_to_tweet(&row)
}

/// Finds a tweet by ID.
pub async fn find_by_id(pool: &Pool, tweet_id: i64) -> Result<Option<Tweet>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT t.id, t.user_id, u.username, t.content, t.created_at
            FROM tweets t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = $1
            "#,
            &[&tweet_id],
        )
        .await?;
    row.map(|r| row_to_tweet(&r)).transpose()
}

/// Lists a user's tweets, newest first.
pub async fn list_by_user(
    pool: &Pool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Tweet>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT t.id, t.user_id, u.username, t.content, t.created_at
            FROM tweets t
            JOIN users u ON u.id = t.user_id
            WHERE t.user_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            &[&user_id, &limit, &offset],
        )
        .await?;
    rows.iter().map(row_to_tweet).collect()
}

/// Lists the timeline for a user: their own tweets plus those of everyone
/// they follow, newest first.
pub async fn timeline(pool: &Pool, user_id: i64, limit: i64, offset: i64) -> Result<Vec<Tweet>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT t.id, t.user_id, u.username, t.content, t.created_at
            FROM tweets t
            JOIN users u ON u.id = t.user_id
            WHERE t.user_id = $1
               OR t.user_id IN (
                    SELECT followee_id FROM follows WHERE follower_id = $1
               )
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            &[&user_id, &limit, &offset],
        )
        .await?;
    rows.iter().map(row_to_tweet).collect()
}

/// Deletes a tweet. Returns `true` if a row was removed.
pub async fn delete(pool: &Pool, tweet_id: i64) -> Result<bool> {
    let client = pool.get().await?;
    let removed = client
        .execute(
            r#"
            DELETE FROM tweets WHERE id = $1
            "#,
            &[&tweet_id],
        )
        .await?;
    Ok(removed > 0)
}
