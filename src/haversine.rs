//! Great-circle distances between collection points.
//!
//! Used for the detour check on candidate vehicles and for comparing the
//! length of competing routes. Ignores roads entirely.

use crate::model::{LonLat, Stop};

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometers.
///
/// Malformed input (NaN, out-of-range degrees) is not validated and simply
/// propagates through the arithmetic.
pub fn haversine_km(from: LonLat, to: LonLat) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of consecutive great-circle legs over a stop sequence.
pub fn route_distance_km(stops: &[Stop]) -> f64 {
    stops
        .windows(2)
        .map(|pair| haversine_km(pair[0].location, pair[1].location))
        .sum()
}
