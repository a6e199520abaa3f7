pub mod sqlite_driver_directory;

pub use sqlite_driver_directory::SqliteDriverDirectory;

use std::str::FromStr;
use std::time::Duration;

use dispatch_config::DatabaseConfig;
use dispatch_errors::{DispatchError, DispatchResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS drivers (
        id TEXT PRIMARY KEY NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        available INTEGER NOT NULL DEFAULT 1,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_drivers_available ON drivers (available)",
];

pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> DispatchResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(DispatchError::Database)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(DispatchError::Database)?;

        info!("数据库连接池已创建: {}", config.url);
        Ok(Self { pool })
    }

    /// 单连接的内存数据库，连接常驻，适用于测试和演示
    pub async fn in_memory() -> DispatchResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(DispatchError::Database)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> DispatchResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(DispatchError::Database)?;
        }
        Ok(())
    }

    pub async fn health_check(&self) -> DispatchResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
