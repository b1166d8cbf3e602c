// Great-circle geometry for launch-site proximity
use serde::{Deserialize, Serialize};

/// Equatorial earth radius in metres (WGS-84), matching what map SDKs report.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in metres.
pub fn haversine_distance_m(from: Coordinates, to: Coordinates) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance rounded to whole metres. Radius checks compare against this value
/// so a site sitting exactly on the boundary is not lost to float noise.
pub fn distance_meters(from: Coordinates, to: Coordinates) -> u64 {
    haversine_distance_m(from, to).round() as u64
}

/// Point reached by travelling `meters` east along the equator from
/// longitude 0. Only used to lay out test fixtures at known distances.
#[cfg(test)]
pub fn equator_point_at(meters: f64) -> Coordinates {
    Coordinates::new(0.0, (meters / EARTH_RADIUS_M).to_degrees())
}
