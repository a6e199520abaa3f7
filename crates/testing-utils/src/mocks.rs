//! `DriverDirectory` 的测试替身
//!
//! 这些实现不依赖数据库，通过脚本化的行为模拟并发竞争、基础设施故障
//! 和慢响应，便于在单元测试中精确复现派单核心需要处理的场景。

use async_trait::async_trait;
use dispatch_domain::{Driver, DriverDirectory};
use dispatch_errors::{DispatchError, DispatchResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 基础的内存目录替身，记录每一次 `reserve` 调用
#[derive(Debug, Clone, Default)]
pub struct MockDriverDirectory {
    drivers: Arc<Mutex<HashMap<String, Driver>>>,
    reserve_calls: Arc<Mutex<Vec<String>>>,
}

impl MockDriverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drivers(drivers: Vec<Driver>) -> Self {
        let map = drivers.into_iter().map(|d| (d.id.clone(), d)).collect();
        Self {
            drivers: Arc::new(Mutex::new(map)),
            reserve_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 按调用顺序返回被请求预占的配送员id
    pub fn reserve_calls(&self) -> Vec<String> {
        self.reserve_calls.lock().unwrap().clone()
    }

    pub fn is_available(&self, driver_id: &str) -> bool {
        self.drivers
            .lock()
            .unwrap()
            .get(driver_id)
            .map(|d| d.available)
            .unwrap_or(false)
    }

    pub fn available_count(&self) -> usize {
        self.drivers
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.available)
            .count()
    }

    /// 模拟另一个订单抢先预占：直接把配送员置为不可用
    pub fn take(&self, driver_id: &str) {
        if let Some(driver) = self.drivers.lock().unwrap().get_mut(driver_id) {
            driver.available = false;
        }
    }
}

#[async_trait]
impl DriverDirectory for MockDriverDirectory {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.available)
            .cloned()
            .collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(drivers)
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        self.reserve_calls
            .lock()
            .unwrap()
            .push(driver_id.to_string());
        let mut drivers = self.drivers.lock().unwrap();
        match drivers.get_mut(driver_id) {
            Some(driver) if driver.available => {
                driver.available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        let mut drivers = self.drivers.lock().unwrap();
        let driver = drivers
            .get_mut(driver_id)
            .ok_or_else(|| DispatchError::driver_not_found(driver_id))?;
        driver.available = true;
        Ok(())
    }
}

/// 快照固定的目录：`list_available` 原样返回构造时的记录（包括不可用的），
/// 用于模拟过期快照或不守约定的目录实现
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    snapshot: Vec<Driver>,
    inner: MockDriverDirectory,
}

impl StaticDirectory {
    pub fn new(snapshot: Vec<Driver>) -> Self {
        Self {
            inner: MockDriverDirectory::with_drivers(snapshot.clone()),
            snapshot,
        }
    }

    pub fn inner(&self) -> &MockDriverDirectory {
        &self.inner
    }
}

#[async_trait]
impl DriverDirectory for StaticDirectory {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        Ok(self.snapshot.clone())
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        self.inner.reserve(driver_id).await
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        self.inner.release(driver_id).await
    }
}

/// 模拟并发竞争的目录
///
/// 快照照常返回，但指定的配送员在预占时已被"别人"抢走；
/// 另外可以让前 N 次预占无条件失败。
#[derive(Debug, Clone)]
pub struct ContendedDirectory {
    inner: MockDriverDirectory,
    stolen: Arc<Mutex<HashSet<String>>>,
    losses_remaining: Arc<Mutex<usize>>,
}

impl ContendedDirectory {
    pub fn new(drivers: Vec<Driver>) -> Self {
        Self {
            inner: MockDriverDirectory::with_drivers(drivers),
            stolen: Arc::new(Mutex::new(HashSet::new())),
            losses_remaining: Arc::new(Mutex::new(0)),
        }
    }

    /// 前 `count` 次预占一律失败，被请求的配送员随之变为不可用
    pub fn lose_first(self, count: usize) -> Self {
        *self.losses_remaining.lock().unwrap() = count;
        self
    }

    /// 指定配送员在快照之后被其他订单抢走
    pub fn steal(self, driver_id: &str) -> Self {
        self.stolen.lock().unwrap().insert(driver_id.to_string());
        self
    }

    pub fn inner(&self) -> &MockDriverDirectory {
        &self.inner
    }
}

#[async_trait]
impl DriverDirectory for ContendedDirectory {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        self.inner.list_available().await
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        let lose = {
            let mut remaining = self.losses_remaining.lock().unwrap();
            let stolen = self.stolen.lock().unwrap().contains(driver_id);
            if *remaining > 0 {
                *remaining -= 1;
                true
            } else {
                stolen
            }
        };

        if lose {
            // 先让竞争者拿走，再走正常路径，调用记录保持完整
            self.inner.take(driver_id);
        }
        self.inner.reserve(driver_id).await
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        self.inner.release(driver_id).await
    }
}

/// 故障注入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    ListAvailable,
    Reserve,
    Release,
}

/// 在指定操作上返回基础设施错误的目录
#[derive(Debug, Clone)]
pub struct FailingDirectory {
    inner: MockDriverDirectory,
    failure_point: FailurePoint,
}

impl FailingDirectory {
    pub fn new(drivers: Vec<Driver>, failure_point: FailurePoint) -> Self {
        Self {
            inner: MockDriverDirectory::with_drivers(drivers),
            failure_point,
        }
    }

    pub fn inner(&self) -> &MockDriverDirectory {
        &self.inner
    }

    fn fail_if(&self, point: FailurePoint) -> DispatchResult<()> {
        if self.failure_point == point {
            Err(DispatchError::directory_error(format!(
                "模拟目录故障: {point:?}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DriverDirectory for FailingDirectory {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        self.fail_if(FailurePoint::ListAvailable)?;
        self.inner.list_available().await
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        self.fail_if(FailurePoint::Reserve)?;
        self.inner.reserve(driver_id).await
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        self.fail_if(FailurePoint::Release)?;
        self.inner.release(driver_id).await
    }
}

/// 给任意目录加上固定延迟，用于测试指派超时
///
/// `list_available` 在读取前等待；`reserve` 先提交再等待，
/// 模拟数据库已完成更新但应答迟到的情况。
#[derive(Debug, Clone)]
pub struct SlowDirectory<D> {
    inner: D,
    list_delay: Duration,
    reserve_delay: Duration,
}

impl<D: DriverDirectory> SlowDirectory<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            list_delay: Duration::ZERO,
            reserve_delay: Duration::ZERO,
        }
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_reserve_delay(mut self, delay: Duration) -> Self {
        self.reserve_delay = delay;
        self
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: DriverDirectory> DriverDirectory for SlowDirectory<D> {
    async fn list_available(&self) -> DispatchResult<Vec<Driver>> {
        tokio::time::sleep(self.list_delay).await;
        self.inner.list_available().await
    }

    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool> {
        let reserved = self.inner.reserve(driver_id).await?;
        tokio::time::sleep(self.reserve_delay).await;
        Ok(reserved)
    }

    async fn release(&self, driver_id: &str) -> DispatchResult<()> {
        self.inner.release(driver_id).await
    }
}
