use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 派单核心配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// 单次正式派单（含重试）的截止时间，0 表示不限制
    pub assign_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            assign_timeout_ms: 2000,
        }
    }
}

impl DispatcherConfig {
    pub fn assign_timeout(&self) -> Option<Duration> {
        match self.assign_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        // 超过一分钟的派单截止时间基本是配置错误
        if self.assign_timeout_ms > 60_000 {
            return Err(anyhow::anyhow!(
                "派单超时时间过长: {}ms，最大允许 60000ms",
                self.assign_timeout_ms
            ));
        }
        Ok(())
    }
}
