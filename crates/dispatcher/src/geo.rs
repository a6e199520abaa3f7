use dispatch_domain::Location;

/// 球体近似下的地球半径
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 两点间的大圆距离（公里）
///
/// 对称、非负，`a == b` 时为 0。球体近似，不保证亚米级精度。
/// `h` 被钳制在 [0, 1]，对跖点的舍入误差不会产生 NaN。
pub fn haversine_km(a: &Location, b: &Location) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = (sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon).clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}
