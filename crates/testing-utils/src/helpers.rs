//! 测试辅助函数

use dispatch_domain::{Driver, Location};

use crate::builders::DriverBuilder;

/// 科伦坡市中心
pub const COLOMBO: Location = Location::new_unchecked(6.9271, 79.8612);

/// 生成 `count` 个可用配送员，id 为 `{prefix}-{序号}`，
/// 沿纬度方向每隔 `spacing_deg` 度排列，序号越小离 `origin` 越近
pub fn drivers_along_meridian(
    prefix: &str,
    origin: Location,
    count: usize,
    spacing_deg: f64,
) -> Vec<Driver> {
    (0..count)
        .map(|i| {
            DriverBuilder::new()
                .with_id(&format!("{prefix}-{i:03}"))
                .at(origin.latitude + spacing_deg * i as f64, origin.longitude)
                .build()
        })
        .collect()
}

/// 生成 `count` 个全部位于同一点的可用配送员
pub fn drivers_at(prefix: &str, location: Location, count: usize) -> Vec<Driver> {
    drivers_along_meridian(prefix, location, count, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drivers_along_meridian() {
        let drivers = drivers_along_meridian("d", COLOMBO, 3, 0.01);
        assert_eq!(drivers.len(), 3);
        assert_eq!(drivers[0].id, "d-000");
        assert_eq!(drivers[0].current_location, COLOMBO);
        assert!(drivers[2].current_location.latitude > drivers[1].current_location.latitude);
    }

    #[test]
    fn test_drivers_at_share_location() {
        let drivers = drivers_at("x", COLOMBO, 4);
        assert!(drivers.iter().all(|d| d.current_location == COLOMBO));
    }
}
