//! 领域仓储抽象
//!
//! 配送员目录由外部系统持有，派单核心只依赖这里定义的能力接口。

use async_trait::async_trait;
use dispatch_errors::DispatchResult;

use crate::entities::Driver;

/// 配送员目录
///
/// # 并发约定
///
/// `reserve` 必须是单个配送员粒度的原子比较并交换：仅当 `available = true`
/// 时将其置为 `false` 并返回 `true`；否则不做任何修改并返回 `false`。
/// 派单核心自身不持有锁，正确性完全依赖这一约定。
#[async_trait]
pub trait DriverDirectory: Send + Sync {
    /// 读取当前可用配送员快照，返回后可能立即过期
    async fn list_available(&self) -> DispatchResult<Vec<Driver>>;

    /// 原子地将配送员从可用翻转为不可用；已不可用或不存在时返回 `false`
    async fn reserve(&self, driver_id: &str) -> DispatchResult<bool>;

    /// 补偿操作，将配送员恢复为可用
    async fn release(&self, driver_id: &str) -> DispatchResult<()>;
}
