use serde::{Deserialize, Serialize};

use crate::entities::Location;

/// 派单模式：正式指派或仅预览
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    #[serde(rename = "COMMIT")]
    Commit,
    #[serde(rename = "PREVIEW")]
    Preview,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Commit => write!(f, "COMMIT"),
            DispatchMode::Preview => write!(f, "PREVIEW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub order_location: Location,
    pub mode: DispatchMode,
}

impl DispatchRequest {
    pub fn commit(order_location: Location) -> Self {
        Self {
            order_location,
            mode: DispatchMode::Commit,
        }
    }

    pub fn preview(order_location: Location) -> Self {
        Self {
            order_location,
            mode: DispatchMode::Preview,
        }
    }
}

/// 派单成功结果
///
/// `attempts` 为本次调用发起的预占次数，预览模式下恒为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub driver_id: String,
    pub distance_km: f64,
    pub mode: DispatchMode,
    pub attempts: u32,
}

impl DispatchOutcome {
    pub fn is_committed(&self) -> bool {
        self.mode == DispatchMode::Commit
    }
}
