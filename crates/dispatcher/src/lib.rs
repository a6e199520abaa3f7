//! 派单核心
//!
//! 根据订单坐标在可用配送员中选出最近的一位：
//! - `geo`: 球面大圆距离（haversine）
//! - `selection`: 最近配送员选择与确定性平局裁决
//! - `service`: 预览（Propose）与正式指派（Assign）两个入口

pub mod geo;
pub mod selection;
pub mod service;

pub use geo::{haversine_km, EARTH_RADIUS_KM};
pub use selection::{rank_by_distance, select_nearest, Selection};
pub use service::{DispatchSettings, DriverDispatchService};
