//! # Delivery Dispatch
//!
//! 外卖订单就近派单系统的组合根。各层职责：
//!
//! - `dispatch-domain`: 领域模型与 `DriverDirectory` 接口
//! - `dispatch-core`: 距离计算、最近配送员选择、预览与正式派单
//! - `dispatch-infrastructure`: SQLite / 内存目录实现与日志初始化
//! - `dispatch-config`: 配置加载与校验

pub mod app;

pub use app::Application;
pub use dispatch_config::AppConfig;
pub use dispatch_core::{DispatchSettings, DriverDispatchService};
pub use dispatch_domain::{DispatchError, DispatchOutcome, Driver, Location};
