use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;

use crate::error::Result;

/// Durable denylist of tokens invalidated before their natural expiry.
///
/// Membership strictly overrides cryptographic validity: a token present
/// here is rejected no matter what the codec says about it. Entries carry
/// the expiry that was embedded in the token itself, so the ledger never
/// holds an entry longer than the token could be replayed.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Records a token as revoked until `expires_at`.
    ///
    /// Callers revoke a token at most once (at logout); a duplicate insert
    /// trips the unique constraint and surfaces as a store error.
    async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Answers whether a token has been revoked. A single unique-indexed
    /// lookup by exact token string.
    async fn is_revoked(&self, token: &str) -> Result<bool>;

    /// Deletes every entry whose expiry is in the past and returns the
    /// number removed. Scheduling is the caller's concern; the delete is
    /// safe to run repeatedly and concurrently with live traffic.
    async fn sweep_expired(&self) -> Result<u64>;
}

/// The PostgreSQL-backed revocation ledger.
#[derive(Clone)]
pub struct PgRevocationLedger {
    pool: Pool,
}

impl PgRevocationLedger {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO revoked_tokens (token, expires_at)
                VALUES ($1, $2)
                "#,
                &[&token, &expires_at],
            )
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1) AS revoked
                "#,
                &[&token],
            )
            .await?;
        Ok(row.try_get("revoked")?)
    }

    async fn sweep_expired(&self) -> Result<u64> {
        let client = self.pool.get().await?;
        let removed = client
            .execute(
                r#"
                DELETE FROM revoked_tokens WHERE expires_at < NOW()
                "#,
                &[],
            )
            .await?;
        Ok(removed)
    }
}
