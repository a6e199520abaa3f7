use async_trait::async_trait;
use chrono::Utc;
use dispatch_domain::{Driver, DriverDirectory, Location};
use dispatch_errors::{DispatchError, DispatchResult};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

/// 基于SQLite的配送员目录
///
/// 预占通过带条件的 `UPDATE ... WHERE available = 1` 实现，
/// 由数据库保证单行更新的原子性。
pub struct SqliteDriverDirectory {
    pool: SqlitePool,
}

impl SqliteDriverDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_driver(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<Driver> {
        Ok(Driver {
            id: row.try_get("id")?,
            current_location: Location::new_unchecked(
                row.try_get("latitude")?,
                row.try_get("longitude")?,
            ),
            available: row.try_get("available")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// 注册或覆盖配送员记录
    pub async fn upsert(&self, driver: &Driver) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, latitude, longitude, available, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                available = excluded.available,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&driver.id)
        .bind(driver.current_location.latitude)
        .bind(driver.current_location.longitude)
        .bind(driver.available)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        debug!("注册配送员成功: {}", driver.id);
        Ok(())
    }

    /// 定位上报：更新配送员当前位置
    pub async fn update_location(&self, driver_id: &str, location: Location) -> DispatchResult<()> {
        if !location.is_valid() {
            return Err(DispatchError::invalid_location(
                location.latitude,
                location.longitude,
            ));
        }

        let result = sqlx::query(
            "UPDATE drivers SET latitude = $2, longitude = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(driver_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::driver_not_found(driver_id));
        }

        debug!("更新配送员位置: {} -> {}", driver_id, location);
        Ok(())
    }

    pub async fn get_by_id(&self, driver_id: &str) -> DispatchResult<Option<Driver>> {
        let row = sqlx::query(
            "SELECT id, latitude, longitude, available, updated_at FROM drivers WHERE id = $1",
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        row.as_ref().map(Self::row_to_driver).transpose()
    }

    pub async fn list_all(&self) -> DispatchResult<Vec<Driver>> {
        let rows = sqlx::query(
            "SELECT id, latitude, longitude, available, updated_at FROM drivers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        rows.iter().map(Self::row_to_driver).collect()
    }
}

#[async_trait]
impl DriverDirectory for SqliteDriverDirectory {
    #[instrument(skip(self))]
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        let rows = sqlx::query(
            "SELECT id, latitude, longitude, available, updated_at FROM drivers WHERE available = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        rows.iter().map(Self::row_to_driver).collect()
    }

    #[instrument(skip(self))]
    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        let result = sqlx::query(
            "UPDATE drivers SET available = 0, updated_at = $2 WHERE id = $1 AND available = 1",
        )
        .bind(driver_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        let reserved = result.rows_affected() == 1;
        debug!("预占配送员 {}: {}", driver_id, reserved);
        Ok(reserved)
    }

    #[instrument(skip(self))]
    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        let result =
            sqlx::query("UPDATE drivers SET available = 1, updated_at = $2 WHERE id = $1")
                .bind(driver_id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::driver_not_found(driver_id));
        }

        debug!("释放配送员: {}", driver_id);
        Ok(())
    }
}
