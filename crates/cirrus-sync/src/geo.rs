//! Great-circle distance for "same place" matching.

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Strictly closer than `threshold_km`. Non-finite input is never nearby.
pub fn is_nearby(lat1: f64, lon1: f64, lat2: f64, lon2: f64, threshold_km: f64) -> bool {
    distance_km(lat1, lon1, lat2, lon2) < threshold_km
}
