pub mod models;

pub use models::{AppConfig, DatabaseConfig, DispatcherConfig, LogFormat, ObservabilityConfig};

/// 环境变量覆盖前缀，例如 `DISPATCH_DISPATCHER__ASSIGN_TIMEOUT_MS=500`
pub const ENV_PREFIX: &str = "DISPATCH";
