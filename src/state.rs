use deadpool_postgres::Pool;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::revoked_tokens::PgRevocationLedger;
use crate::repositories::users::PgCredentialStore;
use crate::services::session::SessionService;
use crate::services::token::TokenCodec;

/// The session core wired to the PostgreSQL-backed stores.
pub type Sessions = SessionService<PgCredentialStore, PgRevocationLedger>;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The session core.
    pub sessions: Sessions,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized with deadpool-postgres");

        let sessions = SessionService::new(
            PgCredentialStore::new(db.clone()),
            PgRevocationLedger::new(db.clone()),
            TokenCodec::new(&config.tokens),
        );
        tracing::info!("Session core initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            sessions,
        })
    }
}
