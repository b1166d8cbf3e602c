// In-memory collaborators for service tests
use crate::application::launch_repository::{
    GeocodeError, Geocoder, LaunchRepository, WeatherProvider,
};
use crate::domain::drone::{DroneRecord, ShareGrant, UserProfile};
use crate::domain::flight::{FlightRecord, StoredFlight, Weather};
use crate::domain::geo::Coordinates;
use crate::domain::location::LocationCandidate;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct InMemoryRepository {
    pub locations: Option<Vec<LocationCandidate>>,
    pub drones: Mutex<HashMap<String, DroneRecord>>,
    pub users: HashMap<String, UserProfile>,
    pub grants: Mutex<Vec<ShareGrant>>,
    pub flights: Mutex<Vec<StoredFlight>>,
    /// Ids whose drone fetch errors instead of returning None
    pub failing_drones: HashSet<String>,
    pub failing_users: HashSet<String>,
    pub fail_grants: bool,
    pub fail_writes: bool,
    /// Latency added to each drone and user fetch
    pub delay: Option<Duration>,
}

impl InMemoryRepository {
    pub fn with_drone(self, id: &str, drone: DroneRecord) -> Self {
        self.drones.lock().unwrap().insert(id.to_string(), drone);
        self
    }

    pub fn drone(&self, id: &str) -> Option<DroneRecord> {
        self.drones.lock().unwrap().get(id).cloned()
    }

    pub fn flight(&self, id: &str) -> Option<FlightRecord> {
        let flights = self.flights.lock().unwrap();
        flights.iter().find(|f| f.id == id).map(|f| f.record.clone())
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("write rejected");
        }
        Ok(())
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        let profile = UserProfile {
            display_name: Some(name.to_string()),
            ..UserProfile::default()
        };
        self.users.insert(id.to_string(), profile);
        self
    }

    pub fn with_grants(self, grants: Vec<ShareGrant>) -> Self {
        *self.grants.lock().unwrap() = grants;
        self
    }

    async fn latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LaunchRepository for InMemoryRepository {
    async fn fetch_reference_locations(&self) -> anyhow::Result<Vec<LocationCandidate>> {
        match &self.locations {
            Some(locations) => Ok(locations.clone()),
            None => anyhow::bail!("locations node unavailable"),
        }
    }

    async fn fetch_drone_by_id(&self, drone_id: &str) -> anyhow::Result<Option<DroneRecord>> {
        self.latency().await;
        if self.failing_drones.contains(drone_id) {
            anyhow::bail!("permission denied reading drones/{}", drone_id);
        }
        Ok(self.drone(drone_id))
    }

    async fn fetch_drones_by_owner(&self, owner_id: &str) -> anyhow::Result<Vec<(String, DroneRecord)>> {
        let drones = self.drones.lock().unwrap();
        let mut owned: Vec<(String, DroneRecord)> = drones
            .iter()
            .filter(|(_, drone)| drone.user_id.as_deref() == Some(owner_id))
            .map(|(id, drone)| (id.clone(), drone.clone()))
            .collect();
        owned.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(owned)
    }

    async fn insert_drone(&self, drone: &DroneRecord) -> anyhow::Result<String> {
        self.check_writable()?;
        let mut drones = self.drones.lock().unwrap();
        let id = format!("-D{}", drones.len() + 1);
        let stamped = DroneRecord {
            created_at: Some(1_704_067_200_000),
            ..drone.clone()
        };
        drones.insert(id.clone(), stamped);
        Ok(id)
    }

    async fn update_drone(&self, drone_id: &str, drone: &DroneRecord) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut drones = self.drones.lock().unwrap();
        let created_at = drones.get(drone_id).and_then(|d| d.created_at);
        drones.insert(
            drone_id.to_string(),
            DroneRecord {
                created_at,
                ..drone.clone()
            },
        );
        Ok(())
    }

    async fn fetch_user_by_id(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        self.latency().await;
        if self.failing_users.contains(user_id) {
            anyhow::bail!("permission denied reading users/{}", user_id);
        }
        Ok(self.users.get(user_id).cloned())
    }

    async fn fetch_all_share_grants(&self) -> anyhow::Result<Vec<ShareGrant>> {
        if self.fail_grants {
            anyhow::bail!("sharedDrones node unavailable");
        }
        Ok(self.grants.lock().unwrap().clone())
    }

    async fn insert_share_grant(&self, grant: &ShareGrant) -> anyhow::Result<()> {
        self.check_writable()?;
        self.grants.lock().unwrap().push(grant.clone());
        Ok(())
    }

    async fn push_flight(&self, flight: &FlightRecord) -> anyhow::Result<String> {
        self.check_writable()?;
        let mut flights = self.flights.lock().unwrap();
        let id = format!("-F{}", flights.len() + 1);
        flights.push(StoredFlight {
            id: id.clone(),
            record: flight.clone(),
        });
        Ok(id)
    }

    async fn fetch_flight_by_id(&self, flight_id: &str) -> anyhow::Result<Option<FlightRecord>> {
        Ok(self.flight(flight_id))
    }

    async fn update_flight(&self, flight_id: &str, flight: &FlightRecord) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut flights = self.flights.lock().unwrap();
        match flights.iter_mut().find(|f| f.id == flight_id) {
            Some(stored) => stored.record = flight.clone(),
            None => anyhow::bail!("no flight {}", flight_id),
        }
        Ok(())
    }

    async fn fetch_flights_by_drone_id(&self, drone_id: &str) -> anyhow::Result<Vec<StoredFlight>> {
        let flights = self.flights.lock().unwrap();
        Ok(flights
            .iter()
            .filter(|f| f.record.drone_id == drone_id)
            .cloned()
            .collect())
    }
}

/// Answers from a fixed table; anything else is NotFound.
#[derive(Default)]
pub struct FakeGeocoder {
    pub answers: HashMap<String, Coordinates>,
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn with(mut self, text: &str, at: Coordinates) -> Self {
        self.answers.insert(text.to_string(), at);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, text: &str) -> Result<Coordinates, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(text)
            .copied()
            .ok_or_else(|| GeocodeError::NotFound(text.to_string()))
    }
}

pub struct FixedWeather(pub Option<Weather>);

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn current_weather(&self, _at: Coordinates) -> anyhow::Result<Weather> {
        match &self.0 {
            Some(weather) => Ok(weather.clone()),
            None => anyhow::bail!("weather service unavailable"),
        }
    }
}
