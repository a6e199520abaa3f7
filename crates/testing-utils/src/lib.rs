//! # Dispatch Testing Utils
//!
//! 派单系统各crate共享的测试工具：
//!
//! - **数据构建器**: 以合理默认值构造 `Driver`
//! - **脚本化目录**: 模拟并发竞争、I/O故障和慢响应的 `DriverDirectory` 实现
//! - **辅助函数**: 常用坐标和批量数据生成
//!
//! ```toml
//! [dev-dependencies]
//! dispatch-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
