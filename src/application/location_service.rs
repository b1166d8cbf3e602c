// Location aggregator - geocoded launch-site catalog and the nearby subset
use crate::application::launch_repository::{DeviceLocation, Geocoder, LaunchRepository};
use crate::domain::geo::{distance_meters, Coordinates};
use crate::domain::location::{LocationCandidate, MapRegion};
use futures::future::join_all;
use std::sync::Arc;

/// Radius used when no configuration overrides it.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 90_000.0;

#[derive(Clone)]
pub struct LocationAggregator {
    repository: Arc<dyn LaunchRepository>,
    geocoder: Arc<dyn Geocoder>,
    radius_meters: f64,
}

impl LocationAggregator {
    pub fn new(
        repository: Arc<dyn LaunchRepository>,
        geocoder: Arc<dyn Geocoder>,
        radius_meters: f64,
    ) -> Self {
        Self {
            repository,
            geocoder,
            radius_meters,
        }
    }

    /// Fill in coordinates for every entry that lacks them. Lookups run
    /// concurrently; the result keeps the input order and a failed lookup
    /// only leaves its own entry unresolved.
    pub async fn resolve_candidates(&self, raw: Vec<LocationCandidate>) -> Vec<LocationCandidate> {
        let pending = raw.iter().filter(|c| c.coordinates().is_none()).count();
        tracing::debug!("Resolving {} of {} locations", pending, raw.len());

        join_all(raw.into_iter().map(|candidate| self.resolve_one(candidate))).await
    }

    async fn resolve_one(&self, mut candidate: LocationCandidate) -> LocationCandidate {
        if candidate.coordinates().is_some() {
            return candidate;
        }

        let query = candidate.geocode_query();
        match self.geocoder.geocode(&query).await {
            Ok(at) => candidate.set_coordinates(at),
            Err(e) => {
                // Half-filled coordinates would read as unresolved anyway
                candidate.latitude = None;
                candidate.longitude = None;
                tracing::warn!("Geocoding location {} failed: {}", candidate.id, e);
            }
        }
        candidate
    }

    /// Full catalog with best-effort coordinates. An unreadable catalog is
    /// reported as empty.
    pub async fn catalog(&self) -> Vec<LocationCandidate> {
        match self.repository.fetch_reference_locations().await {
            Ok(raw) => self.resolve_candidates(raw).await,
            Err(e) => {
                tracing::error!("Error fetching reference locations: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Catalog entries within the configured radius of the device.
    pub async fn nearby_from_device(&self, device: &dyn DeviceLocation) -> Vec<LocationCandidate> {
        let Some(here) = device.current_location().await else {
            tracing::debug!("No device location, nearby set is empty");
            return Vec::new();
        };

        let catalog = self.catalog().await;
        compute_nearby(&catalog, Some(here), self.radius_meters)
    }

    /// Map viewport for the resolved catalog, centred on the device when
    /// nothing in the catalog could be placed.
    pub async fn region(&self, device: &dyn DeviceLocation) -> Option<MapRegion> {
        let catalog = self.catalog().await;
        MapRegion::enclosing(&catalog, device.current_location().await)
    }
}

/// Candidates within `radius_meters` (inclusive) of `reference`. No
/// reference point means no nearby set; unresolved candidates never match.
pub fn compute_nearby(
    candidates: &[LocationCandidate],
    reference: Option<Coordinates>,
    radius_meters: f64,
) -> Vec<LocationCandidate> {
    let Some(reference) = reference else {
        return Vec::new();
    };

    candidates
        .iter()
        .filter(|candidate| {
            candidate
                .coordinates()
                .is_some_and(|at| distance_meters(reference, at) as f64 <= radius_meters)
        })
        .cloned()
        .collect()
}

/// Case-insensitive prefix search over name and address. An empty query
/// returns everything.
pub fn search_by_text(query: &str, candidates: &[LocationCandidate]) -> Vec<LocationCandidate> {
    if query.is_empty() {
        return candidates.to_vec();
    }

    let lowered = query.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.matches_prefix(&lowered))
        .cloned()
        .collect()
}
