use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dispatch_errors::{DispatchError, DispatchResult};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// 地理坐标（十进制度）
///
/// 不可变值类型。通过 [`Location::new`] 构造时会校验经纬度范围，
/// 持久化层读出的可信数据可以走 [`Location::new_unchecked`]。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> DispatchResult<Self> {
        let location = Self {
            latitude,
            longitude,
        };
        if !location.is_valid() {
            return Err(DispatchError::invalid_location(latitude, longitude));
        }
        Ok(location)
    }

    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// NaN 和无穷大同样视为无效
    pub fn is_valid(&self) -> bool {
        (MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude)
            && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// 配送员快照
///
/// 配送员记录由外部的入驻/定位上报流程维护，派单核心只读取快照，
/// 并通过目录的原子预占操作翻转 `available`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub current_location: Location,
    pub available: bool,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn new(id: impl Into<String>, current_location: Location) -> Self {
        Self {
            id: id.into(),
            current_location,
            available: true,
            updated_at: Utc::now(),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn move_to(&mut self, location: Location) {
        self.current_location = location;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_accepts_boundaries() {
        assert!(Location::new(90.0, 180.0).is_ok());
        assert!(Location::new(-90.0, -180.0).is_ok());
        assert!(Location::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        let err = Location::new(90.0001, 0.0).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLocation { .. }));
        assert!(Location::new(0.0, -180.5).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_location_display() {
        let location = Location::new_unchecked(6.9147, 79.971);
        assert_eq!(location.to_string(), "(6.914700, 79.971000)");
    }

    #[test]
    fn test_driver_lifecycle_helpers() {
        let mut driver = Driver::new("d-1", Location::new_unchecked(1.0, 2.0));
        assert!(driver.is_available());

        let before = driver.updated_at;
        driver.move_to(Location::new_unchecked(3.0, 4.0));
        assert_eq!(driver.current_location, Location::new_unchecked(3.0, 4.0));
        assert!(driver.updated_at >= before);

        let driver = driver.unavailable();
        assert!(!driver.is_available());
    }

    #[test]
    fn test_driver_serialization() {
        let driver = Driver::new("d-9", Location::new_unchecked(6.9, 79.9));
        let json = serde_json::to_value(&driver).unwrap();
        assert_eq!(json["id"], "d-9");
        assert_eq!(json["available"], true);
        assert_eq!(json["current_location"]["latitude"], 6.9);
    }
}
