//! 测试数据构建器

use dispatch_domain::{Driver, Location};

/// 配送员构建器，默认位于 (0, 0) 且可用
pub struct DriverBuilder {
    driver: Driver,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self {
            driver: Driver::new("driver-1", Location::new_unchecked(0.0, 0.0)),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.driver.id = id.to_string();
        self
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.driver.current_location = Location::new_unchecked(latitude, longitude);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.driver.available = false;
        self
    }

    pub fn build(self) -> Driver {
        self.driver
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
