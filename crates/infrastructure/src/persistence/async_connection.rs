//! Async database connection using sqlx
//!
//! Provides the SQLite pool behind the key-value backend. Migrations are
//! managed via sqlx's `migrate!()` macro using SQL files in the workspace
//! `migrations/` directory. A process-wide shared handle is available behind
//! a one-time-execution primitive for callers that want a single pool per
//! process with explicit teardown.

use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;

/// Error type for async database operations
#[derive(Debug, thiserror::Error)]
pub enum AsyncDatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for async database connection
#[derive(Debug, Clone)]
pub struct AsyncDatabaseConfig {
    /// Database URL (e.g., "sqlite:data.db" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up
    pub acquire_timeout: Duration,
    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
    /// Whether to run pending migrations on startup
    pub run_migrations: bool,
}

impl Default for AsyncDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:schrokv.db".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            wal_mode: true,
            run_migrations: true,
        }
    }
}

impl AsyncDatabaseConfig {
    /// Create an in-memory database configuration for testing
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1, // Single connection for in-memory
            wal_mode: false,    // Not supported for in-memory
            ..Default::default()
        }
    }

    /// Create a file-based database configuration
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().display().to_string();
        Self {
            url: format!("sqlite:{path_str}"),
            ..Default::default()
        }
    }
}

impl From<&DatabaseConfig> for AsyncDatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        let mut async_config = if config.path == ":memory:" {
            // In-memory databases stay on a single connection regardless
            Self::in_memory()
        } else {
            let mut file_config = Self::file(&config.path);
            file_config.max_connections = config.max_connections;
            file_config
        };
        async_config.acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);
        async_config.run_migrations = config.run_migrations;
        async_config
    }
}

/// Async database connection pool
#[derive(Debug, Clone)]
pub struct AsyncDatabase {
    pool: SqlitePool,
}

impl AsyncDatabase {
    /// Create a new async database connection pool
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn new(config: &AsyncDatabaseConfig) -> Result<Self, AsyncDatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        // Enable WAL mode if configured
        if config.wal_mode && !config.url.contains(":memory:") {
            sqlx::query("PRAGMA journal_mode=WAL")
                .execute(&pool)
                .await?;
            debug!("WAL mode enabled");
        }

        // Set busy timeout for concurrent access
        sqlx::query("PRAGMA busy_timeout=5000")
            .execute(&pool)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Async database pool created"
        );

        Ok(Self { pool })
    }

    /// Create an in-memory database for testing
    pub async fn in_memory() -> Result<Self, AsyncDatabaseError> {
        Self::new(&AsyncDatabaseConfig::in_memory()).await
    }

    /// Get the underlying pool for raw queries
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations using the workspace migration SQL files
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AsyncDatabaseError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}

static SHARED_DATABASE: OnceCell<AsyncDatabase> = OnceCell::const_new();

/// Get the process-wide database handle, initializing it on first use
///
/// Initialization runs exactly once per process; later calls return the same
/// pool and ignore their config argument. Pending migrations are applied as
/// part of the first initialization unless the config opts out. Call
/// [`AsyncDatabase::close`] on the returned handle during shutdown.
pub async fn shared_database(
    config: &AsyncDatabaseConfig,
) -> Result<&'static AsyncDatabase, AsyncDatabaseError> {
    SHARED_DATABASE
        .get_or_try_init(|| async {
            let db = AsyncDatabase::new(config).await?;
            if config.run_migrations {
                db.migrate().await?;
            }
            Ok(db)
        })
        .await
}
