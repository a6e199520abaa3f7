use std::cmp::Ordering;

use dispatch_domain::{DispatchError, DispatchResult, Driver, Location};

use crate::geo::haversine_km;

/// 选择结果：配送员ID及其到订单的距离
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub driver_id: String,
    pub distance_km: f64,
}

/// 排序键：距离升序，距离完全相同时按配送员ID字典序升序
fn compare(a: &Selection, b: &Selection) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.driver_id.cmp(&b.driver_id))
}

fn measure(order: &Location, driver: &Driver) -> Selection {
    Selection {
        driver_id: driver.id.clone(),
        distance_km: haversine_km(order, &driver.current_location),
    }
}

/// 在候选集中选出离订单最近的配送员
///
/// 结果与快照的迭代顺序无关。候选集为空时返回 `NoDriversAvailable`。
pub fn select_nearest(order: &Location, candidates: &[Driver]) -> DispatchResult<Selection> {
    candidates
        .iter()
        .map(|driver| measure(order, driver))
        .min_by(compare)
        .ok_or(DispatchError::NoDriversAvailable)
}

/// 按与 [`select_nearest`] 相同的规则对全部候选排序
pub fn rank_by_distance(order: &Location, candidates: &[Driver]) -> Vec<Selection> {
    let mut ranked: Vec<Selection> = candidates
        .iter()
        .map(|driver| measure(order, driver))
        .collect();
    ranked.sort_by(compare);
    ranked
}
