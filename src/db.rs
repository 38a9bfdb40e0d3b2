use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use crate::error::{AppError, Result};
use std::time::Duration;

/// How many connections the pool may hold. Every request costs at most a
/// couple of short round trips (a token lookup plus one read or write), so
/// a small pool goes a long way.
const POOL_MAX_SIZE: usize = 16;

/// Builds the connection pool from a PostgreSQL connection URL.
///
/// Connections are created lazily on first checkout, so this does not
/// touch the database.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(POOL_MAX_SIZE)
        .wait_timeout(Some(Duration::from_secs(5)))
        .create_timeout(Some(Duration::from_secs(2)))
        .recycle_timeout(Some(Duration::from_secs(1)))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build pool: {}", e)))
}
