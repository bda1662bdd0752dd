use crate::config::Config;
use crate::db::schema::SQLITE_INIT;
use crate::error::VaultError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

/// Build a bounded pool. Acquiring a connection never waits longer than
/// `db_acquire_timeout_secs`; lock contention inside SQLite is bounded the same way.
pub async fn connect(cfg: &Config) -> Result<SqlitePool, VaultError> {
    let timeout = cfg.db_acquire_timeout();
    let connect_opts = SqliteConnectOptions::from_str(cfg.database_url.as_str())?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(timeout);

    let mut pool_opts = SqlitePoolOptions::new().acquire_timeout(timeout);
    if is_in_memory(&cfg.database_url) {
        // each connection would otherwise see its own empty database
        pool_opts = pool_opts
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        pool_opts = pool_opts.max_connections(cfg.db_max_connections);
    }

    let pool = pool_opts.connect_with(connect_opts).await?;
    debug!(database_url = %cfg.database_url, "sqlite pool ready");
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), VaultError> {
    // sqlx::query runs one statement at a time
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Connect and bootstrap the schema.
pub async fn open(cfg: &Config) -> Result<SqlitePool, VaultError> {
    let pool = connect(cfg).await?;
    init_schema(&pool).await?;
    info!(database_url = %cfg.database_url, "database initialized");
    Ok(pool)
}

/// Cheap liveness check used by the health route.
pub async fn ping(pool: &SqlitePool) -> Result<(), VaultError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let cfg = Config {
        database_url: "sqlite::memory:".to_string(),
        ..Config::default()
    };
    open(&cfg).await.expect("open in-memory sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let pool = memory_pool().await;
        init_schema(&pool).await.unwrap();
        ping(&pool).await.unwrap();
    }

    #[test]
    fn detects_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:vault?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:passvault.db"));
    }
}
