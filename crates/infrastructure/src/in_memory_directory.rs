use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use dispatch_domain::{Driver, DriverDirectory, Location};
use dispatch_errors::{DispatchError, DispatchResult};
use tracing::debug;

/// 进程内配送员目录
///
/// 所有记录保存在一把互斥锁下，`reserve` 在持锁期间完成检查与翻转，
/// 对单个配送员而言等价于一次比较并交换。
#[derive(Debug, Clone, Default)]
pub struct InMemoryDriverDirectory {
    drivers: Arc<Mutex<HashMap<String, Driver>>>,
}

impl InMemoryDriverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drivers(drivers: Vec<Driver>) -> Self {
        let drivers = drivers
            .into_iter()
            .map(|driver| (driver.id.clone(), driver))
            .collect();
        Self {
            drivers: Arc::new(Mutex::new(drivers)),
        }
    }

    fn lock(&self) -> DispatchResult<MutexGuard<'_, HashMap<String, Driver>>> {
        self.drivers
            .lock()
            .map_err(|e| DispatchError::directory_error(format!("目录锁已损坏: {e}")))
    }

    pub fn upsert(&self, driver: Driver) -> DispatchResult<()> {
        self.lock()?.insert(driver.id.clone(), driver);
        Ok(())
    }

    pub fn update_location(&self, driver_id: &str, location: Location) -> DispatchResult<()> {
        if !location.is_valid() {
            return Err(DispatchError::invalid_location(
                location.latitude,
                location.longitude,
            ));
        }
        let mut drivers = self.lock()?;
        let driver = drivers
            .get_mut(driver_id)
            .ok_or_else(|| DispatchError::driver_not_found(driver_id))?;
        driver.move_to(location);
        Ok(())
    }

    pub fn get(&self, driver_id: &str) -> DispatchResult<Option<Driver>> {
        Ok(self.lock()?.get(driver_id).cloned())
    }

    pub fn list_all(&self) -> DispatchResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self.lock()?.values().cloned().collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(drivers)
    }

    /// 当前可用的配送员数量，锁损坏时返回0
    pub fn available_count(&self) -> usize {
        self.lock()
            .map(|drivers| drivers.values().filter(|d| d.available).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DriverDirectory for InMemoryDriverDirectory {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self
            .lock()?
            .values()
            .filter(|d| d.available)
            .cloned()
            .collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(drivers)
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        let mut drivers = self.lock()?;
        match drivers.get_mut(driver_id) {
            Some(driver) if driver.available => {
                driver.available = false;
                driver.updated_at = Utc::now();
                debug!("预占配送员成功: {}", driver_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        let mut drivers = self.lock()?;
        let driver = drivers
            .get_mut(driver_id)
            .ok_or_else(|| DispatchError::driver_not_found(driver_id))?;
        driver.available = true;
        driver.updated_at = Utc::now();
        debug!("释放配送员: {}", driver_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(id: &str, lat: f64, lon: f64) -> Driver {
        Driver::new(id, Location::new_unchecked(lat, lon))
    }

    #[tokio::test]
    async fn test_list_available_is_sorted_and_filtered() {
        let directory = InMemoryDriverDirectory::with_drivers(vec![
            driver("c", 0.0, 0.0),
            driver("a", 0.0, 0.0),
            driver("b", 0.0, 0.0).unavailable(),
        ]);

        let ids: Vec<String> = directory
            .list_available()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(directory.list_all().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reserve_flips_only_once() {
        let directory = InMemoryDriverDirectory::with_drivers(vec![driver("d-1", 0.0, 0.0)]);

        assert!(directory.reserve("d-1").await.unwrap());
        assert!(!directory.reserve("d-1").await.unwrap());
        assert!(!directory.reserve("unknown").await.unwrap());
        assert_eq!(directory.available_count(), 0);
    }

    #[tokio::test]
    async fn test_release_and_unknown_driver() {
        let directory = InMemoryDriverDirectory::with_drivers(vec![driver("d-1", 0.0, 0.0)]);
        directory.reserve("d-1").await.unwrap();
        directory.release("d-1").await.unwrap();
        assert_eq!(directory.available_count(), 1);

        let err = directory.release("nobody").await.unwrap_err();
        assert!(matches!(err, DispatchError::DriverNotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reserve_has_single_winner() {
        let directory = InMemoryDriverDirectory::with_drivers(vec![driver("d-1", 0.0, 0.0)]);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.reserve("d-1").await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_update_location() {
        let directory = InMemoryDriverDirectory::with_drivers(vec![driver("d-1", 0.0, 0.0)]);
        let target = Location::new_unchecked(6.9271, 79.8612);

        directory.update_location("d-1", target).unwrap();
        assert_eq!(directory.get("d-1").unwrap().unwrap().current_location, target);

        assert!(directory.update_location("d-9", target).is_err());
        let err = directory
            .update_location("d-1", Location::new_unchecked(0.0, 200.0))
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLocation { .. }));
    }
}
