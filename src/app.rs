use std::sync::Arc;

use anyhow::{Context, Result};
use dispatch_config::AppConfig;
use dispatch_core::{DispatchSettings, DriverDispatchService};
use dispatch_infrastructure::{DatabaseManager, SqliteDriverDirectory};
use tracing::info;

/// 主应用程序：装配数据库、配送员目录和派单服务
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    directory: Arc<SqliteDriverDirectory>,
    service: DriverDispatchService,
}

impl Application {
    /// 创建新的应用实例，连接数据库并确保表结构存在
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化派单应用，数据库: {}", config.database.url);

        let database = DatabaseManager::new(&config.database)
            .await
            .context("创建数据库连接池失败")?;
        database.migrate().await.context("初始化数据库表结构失败")?;

        let directory = Arc::new(SqliteDriverDirectory::new(database.pool().clone()));
        let service =
            DriverDispatchService::with_settings(directory.clone(), dispatch_settings(&config));

        Ok(Self {
            config,
            database,
            directory,
            service,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn directory(&self) -> &SqliteDriverDirectory {
        &self.directory
    }

    pub fn service(&self) -> &DriverDispatchService {
        &self.service
    }

    pub async fn health_check(&self) -> Result<()> {
        self.database
            .health_check()
            .await
            .context("数据库健康检查失败")
    }

    pub async fn shutdown(self) {
        self.database.close().await;
        info!("数据库连接池已关闭");
    }
}

fn dispatch_settings(config: &AppConfig) -> DispatchSettings {
    DispatchSettings {
        assign_timeout: config.dispatcher.assign_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_dispatch_settings_from_config() {
        let mut config = AppConfig::default();
        config.dispatcher.assign_timeout_ms = 250;
        assert_eq!(
            dispatch_settings(&config).assign_timeout,
            Some(Duration::from_millis(250))
        );

        config.dispatcher.assign_timeout_ms = 0;
        assert!(dispatch_settings(&config).assign_timeout.is_none());
    }
}
