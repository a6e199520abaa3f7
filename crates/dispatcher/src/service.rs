use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

use dispatch_domain::{
    DispatchError, DispatchMode, DispatchOutcome, DispatchRequest, DispatchResult, Driver,
    DriverDirectory, Location,
};

use crate::selection::{rank_by_distance, select_nearest};

#[derive(Debug, Clone, Default)]
pub struct DispatchSettings {
    /// 正式指派的截止时间，过后不再发起新的预占并返回 `Timeout`
    pub assign_timeout: Option<Duration>,
}

impl DispatchSettings {
    pub fn with_assign_timeout(timeout: Duration) -> Self {
        Self {
            assign_timeout: Some(timeout),
        }
    }
}

/// 派单服务
///
/// 自身不持有任何共享可变状态，可被任意多个请求任务并发调用。
/// 同一配送员最多被一个并发的正式指派成功预占，这一点完全由
/// [`DriverDirectory::reserve`] 的原子性保证。
pub struct DriverDispatchService {
    directory: Arc<dyn DriverDirectory>,
    settings: DispatchSettings,
}

impl DriverDispatchService {
    pub fn new(directory: Arc<dyn DriverDirectory>) -> Self {
        Self::with_settings(directory, DispatchSettings::default())
    }

    pub fn with_settings(directory: Arc<dyn DriverDirectory>, settings: DispatchSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchResult<DispatchOutcome> {
        match request.mode {
            DispatchMode::Commit => self.assign(request.order_location).await,
            DispatchMode::Preview => self.propose(request.order_location).await,
        }
    }

    /// 预览：返回当前最近的可用配送员，不修改任何状态
    ///
    /// 结果仅供参考，之后的调用可能因可用性变化而返回不同的配送员。
    #[instrument(skip(self, order), fields(order = %order))]
    pub async fn propose(&self, order: Location) -> DispatchResult<DispatchOutcome> {
        ensure_valid(&order)?;
        counter!("dispatch_propose_total").increment(1);

        let candidates = self.snapshot().await?;
        let selection = select_nearest(&order, &candidates).inspect_err(|_| {
            counter!("dispatch_no_drivers_total", "mode" => "preview").increment(1);
        })?;

        debug!(
            "预览派单选择配送员: {} (距离: {:.3}km, 候选数: {})",
            selection.driver_id,
            selection.distance_km,
            candidates.len()
        );

        Ok(DispatchOutcome {
            driver_id: selection.driver_id,
            distance_km: selection.distance_km,
            mode: DispatchMode::Preview,
            attempts: 0,
        })
    }

    /// 正式指派：选出最近的配送员并原子预占
    ///
    /// 预占失败说明被并发请求抢先，剔除该候选后在剩余快照中继续，
    /// 直至成功或候选耗尽。重试次数以快照大小为上界。
    ///
    /// 截止时间只在两次预占之间检查，已发出的 `reserve` 不会被中途取消：
    /// 它若成功，即使已超过截止时间也照常返回该配送员。
    #[instrument(skip(self, order), fields(order = %order))]
    pub async fn assign(&self, order: Location) -> DispatchResult<DispatchOutcome> {
        ensure_valid(&order)?;
        counter!("dispatch_assign_total").increment(1);

        let deadline = self.settings.assign_timeout.map(|t| Instant::now() + t);
        let candidates = match deadline {
            // 读取快照没有副作用，可以直接取消
            Some(at) => timeout_at(at, self.snapshot())
                .await
                .map_err(|_| self.deadline_exceeded())??,
            None => self.snapshot().await?,
        };

        self.reserve_nearest(order, candidates, deadline).await
    }

    async fn reserve_nearest(
        &self,
        order: Location,
        candidates: Vec<Driver>,
        deadline: Option<Instant>,
    ) -> DispatchResult<DispatchOutcome> {
        if candidates.is_empty() {
            counter!("dispatch_no_drivers_total", "mode" => "commit").increment(1);
            warn!("没有可用的配送员");
            return Err(DispatchError::NoDriversAvailable);
        }

        // 剔除失败候选后剩余集合的最小值，恰好是排序中的下一位
        let ranked = rank_by_distance(&order, &candidates);
        let mut attempts = 0u32;
        for selection in ranked {
            if deadline.is_some_and(|at| Instant::now() >= at) {
                return Err(self.deadline_exceeded());
            }

            attempts += 1;
            if self.directory.reserve(&selection.driver_id).await? {
                info!(
                    "派单成功: 配送员 {} (距离: {:.3}km, 尝试次数: {})",
                    selection.driver_id, selection.distance_km, attempts
                );
                return Ok(DispatchOutcome {
                    driver_id: selection.driver_id,
                    distance_km: selection.distance_km,
                    mode: DispatchMode::Commit,
                    attempts,
                });
            }

            counter!("dispatch_reserve_conflicts_total").increment(1);
            debug!(
                "配送员 {} 已被其他订单预占，尝试下一位候选",
                selection.driver_id
            );
        }

        counter!("dispatch_no_drivers_total", "mode" => "commit").increment(1);
        warn!(
            "候选配送员在竞争中全部被预占: 共尝试 {} 次",
            attempts
        );
        Err(DispatchError::NoDriversAvailable)
    }

    fn deadline_exceeded(&self) -> DispatchError {
        let millis = self
            .settings
            .assign_timeout
            .map(|t| t.as_millis())
            .unwrap_or_default();
        counter!("dispatch_assign_timeouts_total").increment(1);
        warn!("正式派单超时: 超过 {}ms", millis);
        DispatchError::Timeout(format!("派单超过 {millis}ms 未完成"))
    }

    async fn snapshot(&self) -> DispatchResult<Vec<Driver>> {
        let mut drivers = self.directory.list_available().await?;
        // 不信任目录实现，快照里混入的不可用记录一律剔除
        drivers.retain(Driver::is_available);
        Ok(drivers)
    }
}

fn ensure_valid(order: &Location) -> DispatchResult<()> {
    if order.is_valid() {
        Ok(())
    } else {
        Err(DispatchError::invalid_location(order.latitude, order.longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_infrastructure::InMemoryDriverDirectory;
    use dispatch_testing_utils::DriverBuilder;

    fn service_with(drivers: Vec<Driver>) -> (Arc<InMemoryDriverDirectory>, DriverDispatchService) {
        let directory = Arc::new(InMemoryDriverDirectory::with_drivers(drivers));
        let service = DriverDispatchService::new(directory.clone());
        (directory, service)
    }

    #[tokio::test]
    async fn test_dispatch_routes_on_mode() {
        let (directory, service) = service_with(vec![
            DriverBuilder::new().with_id("d-1").at(0.0, 0.0).build(),
        ]);
        let order = Location::new_unchecked(0.0, 0.0);

        let preview = service.dispatch(DispatchRequest::preview(order)).await.unwrap();
        assert_eq!(preview.mode, DispatchMode::Preview);
        assert_eq!(preview.attempts, 0);
        assert_eq!(directory.available_count(), 1);

        let commit = service.dispatch(DispatchRequest::commit(order)).await.unwrap();
        assert!(commit.is_committed());
        assert_eq!(commit.attempts, 1);
        assert_eq!(directory.available_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_invalid_order_location() {
        let (_, service) = service_with(vec![DriverBuilder::new().build()]);
        let order = Location::new_unchecked(120.0, 0.0);

        let err = service.assign(order).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLocation { .. }));
        let err = service.propose(order).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLocation { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_ignores_unavailable_records() {
        let (_, service) = service_with(vec![
            DriverBuilder::new().with_id("busy").at(0.0, 0.0).unavailable().build(),
            DriverBuilder::new().with_id("free").at(1.0, 1.0).build(),
        ]);

        let outcome = service.assign(Location::new_unchecked(0.0, 0.0)).await.unwrap();
        assert_eq!(outcome.driver_id, "free");
    }

    #[test]
    fn test_settings_default_has_no_deadline() {
        assert!(DispatchSettings::default().assign_timeout.is_none());
        let settings = DispatchSettings::with_assign_timeout(Duration::from_millis(10));
        assert_eq!(settings.assign_timeout, Some(Duration::from_millis(10)));
    }
}
