// Collaborator traits for the external store, geocoder, device and weather
use crate::domain::drone::{DroneRecord, ShareGrant, UserProfile};
use crate::domain::flight::{FlightRecord, StoredFlight, Weather};
use crate::domain::geo::Coordinates;
use crate::domain::location::LocationCandidate;
use async_trait::async_trait;
use thiserror::Error;

#[async_trait]
pub trait LaunchRepository: Send + Sync {
    /// Bulk read of the launch-site catalog
    async fn fetch_reference_locations(&self) -> anyhow::Result<Vec<LocationCandidate>>;

    async fn fetch_drone_by_id(&self, drone_id: &str) -> anyhow::Result<Option<DroneRecord>>;

    /// The owner's rockets keyed by store id, in creation order
    async fn fetch_drones_by_owner(&self, owner_id: &str) -> anyhow::Result<Vec<(String, DroneRecord)>>;

    /// Create a rocket; the store stamps `createdAt` and assigns the id
    async fn insert_drone(&self, drone: &DroneRecord) -> anyhow::Result<String>;

    async fn update_drone(&self, drone_id: &str, drone: &DroneRecord) -> anyhow::Result<()>;

    async fn fetch_user_by_id(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>>;

    async fn fetch_all_share_grants(&self) -> anyhow::Result<Vec<ShareGrant>>;

    async fn insert_share_grant(&self, grant: &ShareGrant) -> anyhow::Result<()>;

    /// Append a flight, returning the id the store assigned
    async fn push_flight(&self, flight: &FlightRecord) -> anyhow::Result<String>;

    async fn fetch_flight_by_id(&self, flight_id: &str) -> anyhow::Result<Option<FlightRecord>>;

    async fn update_flight(&self, flight_id: &str, flight: &FlightRecord) -> anyhow::Result<()>;

    async fn fetch_flights_by_drone_id(&self, drone_id: &str) -> anyhow::Result<Vec<StoredFlight>>;
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no geocoding result for '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve free text (a place name, an address) to a single point
    async fn geocode(&self, text: &str) -> Result<Coordinates, GeocodeError>;
}

#[async_trait]
pub trait DeviceLocation: Send + Sync {
    /// None when permission was denied or no fix is available
    async fn current_location(&self) -> Option<Coordinates>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, at: Coordinates) -> anyhow::Result<Weather>;
}
