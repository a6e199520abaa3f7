#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::Arc;

    use delivery_dispatch::{AppConfig, Application, DispatchError, Location};
    use dispatch_domain::DriverDirectory;
    use dispatch_testing_utils::{drivers_along_meridian, COLOMBO};
    use futures::future::join_all;
    use tempfile::{NamedTempFile, TempDir};

    fn config_for(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("dispatch.db").display()
        );
        config
    }

    #[tokio::test]
    async fn test_application_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let app = Application::new(config_for(&dir)).await.unwrap();
        app.health_check().await.unwrap();

        for driver in drivers_along_meridian("d", COLOMBO, 3, 0.01) {
            app.directory().upsert(&driver).await.unwrap();
        }

        let proposal = app.service().propose(COLOMBO).await.unwrap();
        assert_eq!(proposal.driver_id, "d-000");
        assert_eq!(app.directory().list_available().await.unwrap().len(), 3);

        let outcome = app.service().assign(COLOMBO).await.unwrap();
        assert_eq!(outcome.driver_id, "d-000");
        let stored = app.directory().get_by_id("d-000").await.unwrap().unwrap();
        assert!(!stored.available);

        // 位置上报后，最近的配送员随之变化
        app.directory()
            .update_location("d-002", COLOMBO)
            .await
            .unwrap();
        let next = app.service().assign(COLOMBO).await.unwrap();
        assert_eq!(next.driver_id, "d-002");

        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_data_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = Application::new(config_for(&dir)).await.unwrap();
            for driver in drivers_along_meridian("d", COLOMBO, 2, 0.01) {
                app.directory().upsert(&driver).await.unwrap();
            }
            app.service().assign(COLOMBO).await.unwrap();
            app.shutdown().await;
        }

        let app = Application::new(config_for(&dir)).await.unwrap();
        assert_eq!(app.directory().list_all().await.unwrap().len(), 2);
        let outcome = app.service().assign(COLOMBO).await.unwrap();
        assert_eq!(outcome.driver_id, "d-001");

        let err = app.service().assign(COLOMBO).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoDriversAvailable));
        app.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_through_application() {
        let dir = tempfile::tempdir().unwrap();
        let app = Arc::new(Application::new(config_for(&dir)).await.unwrap());
        for driver in drivers_along_meridian("d", COLOMBO, 5, 0.001) {
            app.directory().upsert(&driver).await.unwrap();
        }

        let handles = (0..5).map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.service().assign(COLOMBO).await })
        });
        let ids: HashSet<String> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().driver_id)
            .collect();

        assert_eq!(ids.len(), 5);
        assert!(app.directory().list_available().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_file_drives_application() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("from-file.db");
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite://{}?mode=rwc"
max_connections = 2
min_connections = 1
connection_timeout_seconds = 5

[dispatcher]
assign_timeout_ms = 0

[observability]
log_level = "debug"
log_format = "compact"
"#,
            db_path.display()
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.database.max_connections, 2);
        assert!(config.dispatcher.assign_timeout().is_none());

        let app = Application::new(config).await.unwrap();
        assert!(app.service().settings().assign_timeout.is_none());
        assert!(db_path.exists());

        let err = app
            .service()
            .propose(Location::new_unchecked(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(err.is_no_drivers());
    }
}
