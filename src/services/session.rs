use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::user::PublicUser;
use crate::repositories::revoked_tokens::RevocationLedger;
use crate::repositories::users::CredentialStore;
use crate::services::password;
use crate::services::token::{AccessClaims, TokenCodec, TokenError};

/// The result of a successful login or refresh: a fresh token pair plus the
/// public projection of the user. Never stored server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Orchestrates identity lookup, password verification, token issuance and
/// revocation. The only component that composes all four; it holds no
/// per-session state of its own.
#[derive(Clone)]
pub struct SessionService<C, L> {
    users: C,
    ledger: L,
    codec: TokenCodec,
}

impl<C: CredentialStore, L: RevocationLedger> SessionService<C, L> {
    pub fn new(users: C, ledger: L, codec: TokenCodec) -> Self {
        Self { users, ledger, codec }
    }

    fn mint_pair(&self, user: &crate::models::user::User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.codec.issue_access_token(user)?,
            refresh_token: self.codec.issue_refresh_token(user.id)?,
            user: PublicUser::from(user),
        })
    }

    /// Authenticates a user by username or email and plaintext password.
    ///
    /// Unknown identifier and wrong password fold into the same
    /// `InvalidCredentials` error, so a caller learns nothing about whether
    /// the account exists.
    pub async fn login(&self, identifier: &str, plaintext: &str) -> Result<TokenPair> {
        tracing::debug!("Login attempt for identifier: {}", identifier);

        let user = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify_password(plaintext, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("User authenticated: {}", user.id);
        self.mint_pair(&user)
    }

    /// Exchanges a valid refresh token for a brand-new token pair.
    ///
    /// The user is re-fetched by ID so a role change or deactivation takes
    /// effect here, not only at the next login. The used refresh token is
    /// not revoked and stays valid until its natural expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .codec
            .verify_refresh_token(refresh_token)
            .map_err(|e| match e {
                TokenError::Expired => AppError::RefreshTokenExpired,
                TokenError::Invalid => AppError::InvalidRefreshToken,
            })?;

        // Ledger membership overrides cryptographic validity.
        if self.ledger.is_revoked(refresh_token).await? {
            tracing::warn!("Revoked refresh token presented for user {}", claims.sub);
            return Err(AppError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!("Token pair refreshed for user: {}", user.id);
        self.mint_pair(&user)
    }

    /// Records an access token in the revocation ledger.
    ///
    /// A token that no longer verifies (expired, invalid or already
    /// revoked) is treated as already logged out: the call succeeds without
    /// touching the ledger, which is what makes a repeated logout of the
    /// same token succeed.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let claims = match self.authenticate(access_token).await {
            Ok(claims) => claims,
            Err(AppError::TokenExpired) | Err(AppError::TokenInvalid) => {
                tracing::debug!("Logout of an unverifiable token; treating as already logged out");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        // Keep the ledger entry exactly as long as the token could be replayed.
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));

        self.ledger.record(access_token, expires_at).await?;
        tracing::info!("User logged out: {}", claims.sub);
        Ok(())
    }

    /// Verifies an access token for the request gate: codec check AND NOT
    /// ledger-revoked, in that order. Never skips the ledger on codec
    /// success.
    pub async fn authenticate(&self, access_token: &str) -> Result<AccessClaims> {
        let claims = self
            .codec
            .verify_access_token(access_token)
            .map_err(|e| match e {
                TokenError::Expired => AppError::TokenExpired,
                TokenError::Invalid => AppError::TokenInvalid,
            })?;

        if self.ledger.is_revoked(access_token).await? {
            tracing::debug!("Revoked access token presented for user {}", claims.sub);
            return Err(AppError::TokenInvalid);
        }

        Ok(claims)
    }

    /// Removes expired ledger entries. Called from the scheduled sweep task.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let removed = self.ledger.sweep_expired().await?;
        if removed > 0 {
            tracing::info!("Swept {} expired revocation entries", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::models::user::{Role, User};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use zeroize::Zeroizing;

    struct MemoryUsers {
        users: Mutex<Vec<User>>,
    }

    impl MemoryUsers {
        fn seeded() -> Self {
            let now = Utc::now();
            Self {
                users: Mutex::new(vec![User {
                    id: 1,
                    username: "testuser".to_string(),
                    email: "testuser@example.com".to_string(),
                    password_hash: password::hash_password("password123").unwrap(),
                    role: Role::User,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                }]),
            }
        }

        fn remove(&self, id: i64) {
            self.users.lock().unwrap().retain(|u| u.id != id);
        }
    }

    #[async_trait]
    impl CredentialStore for &MemoryUsers {
        async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.is_active && (u.username == identifier || u.email == identifier))
                .cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.is_active && u.id == id)
                .cloned())
        }
    }

    #[derive(Default)]
    struct MemoryLedger {
        entries: Mutex<HashMap<String, DateTime<Utc>>>,
    }

    #[async_trait]
    impl RevocationLedger for &MemoryLedger {
        async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(token) {
                return Err(AppError::Internal("duplicate revocation".to_string()));
            }
            entries.insert(token.to_string(), expires_at);
            Ok(())
        }

        async fn is_revoked(&self, token: &str) -> Result<bool> {
            Ok(self.entries.lock().unwrap().contains_key(token))
        }

        async fn sweep_expired(&self) -> Result<u64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            let now = Utc::now();
            entries.retain(|_, expires_at| *expires_at >= now);
            Ok((before - entries.len()) as u64)
        }
    }

    fn test_config() -> TokenConfig {
        TokenConfig {
            access_secret: Zeroizing::new(b"test-access-secret".to_vec()),
            refresh_secret: Zeroizing::new(b"test-refresh-secret".to_vec()),
            access_token_minutes: 15,
            refresh_token_days: 7,
        }
    }

    fn service<'a>(
        users: &'a MemoryUsers,
        ledger: &'a MemoryLedger,
        config: &TokenConfig,
    ) -> SessionService<&'a MemoryUsers, &'a MemoryLedger> {
        SessionService::new(users, ledger, TokenCodec::new(config))
    }

    #[tokio::test]
    async fn login_returns_pair_for_seeded_user() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        assert_eq!(pair.user.id, 1);

        let claims = TokenCodec::new(&test_config())
            .verify_access_token(&pair.access_token)
            .unwrap();
        assert_eq!(claims.sub, 1);
    }

    #[tokio::test]
    async fn login_by_email_resolves_same_user() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions
            .login("testuser@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(pair.user.id, 1);
    }

    #[tokio::test]
    async fn user_projection_has_no_password_hash() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        let value = serde_json::to_value(&pair.user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("password").is_none());
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let unknown = sessions.login("nonexistent", "password123").await.unwrap_err();
        let wrong = sessions.login("testuser", "wrong-password").await.unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn refresh_mints_a_new_pair() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        let refreshed = sessions.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, 1);
        assert_ne!(refreshed.access_token, pair.access_token);
    }

    #[tokio::test]
    async fn used_refresh_token_stays_valid_until_expiry() {
        // Faithful to the source: refresh does not revoke the token it
        // consumed, so presenting it again still succeeds.
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        sessions.refresh(&pair.refresh_token).await.unwrap();
        sessions.refresh(&pair.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_with_garbage_is_invalid() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let err = sessions.refresh("not.a.token").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn expired_refresh_token_is_reported_as_expired() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let mut config = test_config();
        config.refresh_token_days = -1;
        let sessions = service(&users, &ledger, &config);

        let pair = sessions.login("testuser", "password123").await.unwrap();
        let err = sessions.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::RefreshTokenExpired));
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_is_user_not_found() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        users.remove(1);

        let err = sessions.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn revoked_refresh_token_is_rejected_despite_valid_signature() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();
        (&ledger)
            .record(&pair.refresh_token, Utc::now() + Duration::days(7))
            .await
            .unwrap();

        let err = sessions.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn logout_revokes_the_access_token() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();

        // Structurally the token is still valid after logout; only the
        // ledger makes authenticate reject it.
        sessions.logout(&pair.access_token).await.unwrap();
        assert!((&ledger).is_revoked(&pair.access_token).await.unwrap());
        assert!(TokenCodec::new(&test_config())
            .verify_access_token(&pair.access_token)
            .is_ok());

        let err = sessions.authenticate(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let sessions = service(&users, &ledger, &test_config());

        let pair = sessions.login("testuser", "password123").await.unwrap();

        // Second call sees the token as already revoked and short-circuits
        // to success; the duplicate ledger write never happens.
        sessions.logout(&pair.access_token).await.unwrap();
        sessions.logout(&pair.access_token).await.unwrap();
        assert_eq!(ledger.entries.lock().unwrap().len(), 1);

        // An unverifiable token is always a successful no-op.
        sessions.logout("not.a.token").await.unwrap();
    }

    #[tokio::test]
    async fn logout_of_expired_token_succeeds_without_ledger_write() {
        let users = MemoryUsers::seeded();
        let ledger = MemoryLedger::default();
        let mut config = test_config();
        config.access_token_minutes = -5;
        let sessions = service(&users, &ledger, &config);

        let pair = sessions.login("testuser", "password123").await.unwrap();
        sessions.logout(&pair.access_token).await.unwrap();
        assert!(!(&ledger).is_revoked(&pair.access_token).await.unwrap());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let ledger = MemoryLedger::default();
        let past = Utc::now() - Duration::hours(1);
        let future = Utc::now() + Duration::hours(1);
        (&ledger).record("stale", past).await.unwrap();
        (&ledger).record("live", future).await.unwrap();

        assert_eq!((&ledger).sweep_expired().await.unwrap(), 1);
        assert!((&ledger).is_revoked("live").await.unwrap());
        assert!(!(&ledger).is_revoked("stale").await.unwrap());
        assert_eq!((&ledger).sweep_expired().await.unwrap(), 0);
    }
}
