use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents a tweet.
#[derive(Clone, Debug, Serialize)]
pub struct Tweet {
    /// The unique identifier for the tweet.
    pub id: i64,
    /// The ID of the author.
    pub user_id: i64,
    /// The author's username, joined in for list responses.
    pub username: String,
    /// The tweet body, 1 to 280 characters.
    pub content: String,
    /// The timestamp when the tweet was created.
    pub created_at: DateTime<Utc>,
}
