// Launch-site catalog entries and the map viewport around them
use super::geo::Coordinates;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCandidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            phone: None,
            website: None,
            code: None,
            latitude: None,
            longitude: None,
        }
    }

    #[cfg(test)]
    pub fn with_coordinates(mut self, at: Coordinates) -> Self {
        self.set_coordinates(at);
        self
    }

    pub fn set_coordinates(&mut self, at: Coordinates) {
        self.latitude = Some(at.latitude);
        self.longitude = Some(at.longitude);
    }

    /// Both halves must be present; a lone latitude is as good as none.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Free text handed to the geocoder: "<name> <address>".
    pub fn geocode_query(&self) -> String {
        format!("{} {}", self.name, self.address).trim().to_string()
    }

    /// Case-insensitive prefix match on name or address. `lowered_query`
    /// must already be lowercase.
    pub fn matches_prefix(&self, lowered_query: &str) -> bool {
        self.name.to_lowercase().starts_with(lowered_query)
            || self.address.to_lowercase().starts_with(lowered_query)
    }
}

/// Map viewport: a centre plus the latitude/longitude span to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

const REGION_PADDING: f64 = 1.5;
const DEFAULT_LATITUDE_DELTA: f64 = 0.0922;
const DEFAULT_LONGITUDE_DELTA: f64 = 0.0421;

impl MapRegion {
    /// Viewport framing every resolved candidate, padded by half its span.
    /// Without resolved candidates, a street-level view of `fallback`.
    pub fn enclosing(candidates: &[LocationCandidate], fallback: Option<Coordinates>) -> Option<Self> {
        let points: Vec<Coordinates> = candidates.iter().filter_map(|c| c.coordinates()).collect();

        if points.is_empty() {
            return fallback.map(|center| Self {
                latitude: center.latitude,
                longitude: center.longitude,
                latitude_delta: DEFAULT_LATITUDE_DELTA,
                longitude_delta: DEFAULT_LONGITUDE_DELTA,
            });
        }

        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lon = min_lon.min(p.longitude);
            max_lon = max_lon.max(p.longitude);
        }

        Some(Self {
            latitude: (min_lat + max_lat) / 2.0,
            longitude: (min_lon + max_lon) / 2.0,
            latitude_delta: (max_lat - min_lat) * REGION_PADDING,
            longitude_delta: (max_lon - min_lon) * REGION_PADDING,
        })
    }
}
