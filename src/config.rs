use std::env;
use anyhow::{Context, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Default access token lifetime in minutes.
const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 15;
/// Default refresh token lifetime in days.
const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;

/// Signing material and lifetimes for the token codec.
///
/// Resolved exactly once at startup and passed by reference into the codec,
/// so tests can construct one with deterministic secrets.
#[derive(Clone)]
pub struct TokenConfig {
    /// The secret used to sign and verify access tokens.
    pub access_secret: Zeroizing<Vec<u8>>,
    /// The secret used to sign and verify refresh tokens. Independent from
    /// the access secret so leaking one family's material does not
    /// compromise the other.
    pub refresh_secret: Zeroizing<Vec<u8>>,
    /// Access token lifetime in minutes.
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days.
    pub refresh_token_days: i64,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// Token signing configuration.
    pub tokens: TokenConfig,
}

/// Reads a signing secret from the environment, generating a random one when
/// unset. Generated secrets do not survive a restart: every token issued
/// before the restart becomes unverifiable. Acceptable for local development
/// only.
fn secret_from_env(var: &str) -> Zeroizing<Vec<u8>> {
    match env::var(var) {
        Ok(value) => Zeroizing::new(value.into_bytes()),
        Err(_) => {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            tracing::warn!(
                "{} not set; generated a random {}-byte secret. Tokens will not verify across restarts",
                var,
                bytes.len()
            );
            Zeroizing::new(hex::encode(bytes).into_bytes())
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let access_token_minutes = env::var("ACCESS_TOKEN_MINUTES")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_MINUTES.to_string())
            .parse()
            .context("Invalid ACCESS_TOKEN_MINUTES")?;

        let refresh_token_days = env::var("REFRESH_TOKEN_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_TOKEN_DAYS.to_string())
            .parse()
            .context("Invalid REFRESH_TOKEN_DAYS")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            tokens: TokenConfig {
                access_secret: secret_from_env("JWT_ACCESS_SECRET"),
                refresh_secret: secret_from_env("JWT_REFRESH_SECRET"),
                access_token_minutes,
                refresh_token_days,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_hex_and_unique() {
        let a = secret_from_env("CHIRP_TEST_UNSET_SECRET");
        let b = secret_from_env("CHIRP_TEST_UNSET_SECRET");
        assert_eq!(a.len(), 64);
        assert!(a.iter().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(*a, *b);
    }

    #[test]
    fn configured_secret_is_used_verbatim() {
        // Env access is process-global; use a name no other test touches.
        unsafe { env::set_var("CHIRP_TEST_SET_SECRET", "configured-secret") };
        let secret = secret_from_env("CHIRP_TEST_SET_SECRET");
        assert_eq!(&secret[..], b"configured-secret");
        unsafe { env::remove_var("CHIRP_TEST_SET_SECRET") };
    }
}
