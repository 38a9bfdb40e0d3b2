use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::{AppError, Result};
use crate::models::user::{Role, User};

/// Why a token failed verification. Signature failures and every other
/// decode failure collapse into `Invalid`; only a structurally sound token
/// past its expiry is `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token's embedded expiry is in the past.
    Expired,
    /// The signature or shape check failed.
    Invalid,
}

/// The payload of an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// The user's ID.
    pub sub: i64,
    /// The user's username at issuance time.
    pub username: String,
    /// The user's role at issuance time.
    pub role: Role,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
    /// Token ID, for log correlation.
    pub jti: Uuid,
}

/// The payload of a refresh token. Intentionally minimal: no username or
/// role, so a leaked refresh token carries as little as possible and every
/// refresh forces a fresh user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// The user's ID.
    pub sub: i64,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
    /// Token ID, for log correlation.
    pub jti: Uuid,
}

/// Mints and verifies signed, expiring tokens (HS256).
///
/// Access and refresh tokens are signed with independent secrets. Expiry is
/// always derived from the configured lifetimes at issuance time; no caller
/// may supply one.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

impl TokenCodec {
    /// Creates a codec from resolved configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(&config.access_secret),
            access_decoding: DecodingKey::from_secret(&config.access_secret),
            refresh_encoding: EncodingKey::from_secret(&config.refresh_secret),
            refresh_decoding: DecodingKey::from_secret(&config.refresh_secret),
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::days(config.refresh_token_days),
        }
    }

    /// Issues a signed access token for a user.
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Issues a signed refresh token carrying only the user's ID.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Verifies an access token's signature and expiry.
    pub fn verify_access_token(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Verifies a refresh token's signature and expiry.
    pub fn verify_refresh_token(&self, token: &str) -> std::result::Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}
