pub mod keys;
pub mod kv;
pub mod records;
pub mod repository;

pub use kv::{KvStore, MemoryKvStore, PgKvStore};
pub use repository::StoreRepository;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use storeloc_core::{AppConfig, RecordError};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/storeloc-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("malformed record at '{key}': {reason}")]
    MalformedRecord { key: String, reason: String },
    #[error("invalid store at position {index}: {source}")]
    InvalidStore {
        index: usize,
        #[source]
        source: RecordError,
    },
    #[error("batch must contain at least one store")]
    EmptyBatch,
    #[error("counter at '{key}' overflowed")]
    CounterOverflow { key: String },
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Open the storage backend selected by `config`: Postgres (migrated) when
/// a database URL is configured, otherwise the in-memory store.
///
/// # Errors
///
/// Returns [`DbError`] if the pool cannot connect or migrations fail.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn KvStore>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        let pool = connect_pool(url, PoolConfig::from_app_config(config)).await?;
        run_migrations(&pool).await?;
        tracing::info!("connected to postgres key-value store");
        return Ok(Arc::new(PgKvStore::new(pool)));
    }

    tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
    Ok(Arc::new(MemoryKvStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn open_store_without_database_url_is_in_memory() {
        let config = AppConfig {
            database_url: None,
            env: storeloc_core::Environment::Development,
            bind_addr: ([127, 0, 0, 1], 3000).into(),
            log_level: "info".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
            db_acquire_timeout_secs: 1,
            geocoder_base_url: "http://localhost/".to_string(),
            geocoder_timeout_secs: 1,
        };
        let kv = open_store(&config).await.expect("memory store");
        kv.ping().await.expect("ping");
        assert_eq!(kv.get("store:count").await.expect("get"), None);
    }

    #[test]
    fn invalid_store_error_names_position_and_field() {
        let err = DbError::InvalidStore {
            index: 3,
            source: RecordError::EmptyField("address"),
        };
        assert_eq!(
            err.to_string(),
            "invalid store at position 3: field 'address' must not be empty"
        );
    }
}
