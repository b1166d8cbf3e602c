// Firebase Realtime Database repository over the REST API
use crate::application::launch_repository::LaunchRepository;
use crate::domain::drone::{AccessType, DroneRecord, ShareGrant, UserProfile};
use crate::domain::flight::{FlightRecord, StoredFlight};
use crate::domain::geo::Coordinates;
use crate::domain::location::LocationCandidate;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const LOCATIONS: &str = "locations";
const DRONES: &str = "drones";
const USERS: &str = "users";
const SHARED_DRONES: &str = "sharedDrones";
const FLIGHTS: &str = "flights";

#[derive(Debug, Clone)]
pub struct FirebaseRepository {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

/// Catalog entry as the locations node spells it.
#[derive(Debug, Deserialize)]
struct FirebaseLocation {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Location", default)]
    location: Option<String>,
    #[serde(rename = "Phone Number", default)]
    phone: Option<Value>,
    #[serde(rename = "Website", default)]
    website: Option<String>,
    #[serde(rename = "Code", default)]
    code: Option<Value>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Grant as the sharedDrones node stores it: `accessType` is a flag, true for Edit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredGrant<'a> {
    drone_id: &'a str,
    shared_with: &'a str,
    shared_by: &'a str,
    access_type: bool,
}

impl<'a> From<&'a ShareGrant> for StoredGrant<'a> {
    fn from(grant: &'a ShareGrant) -> Self {
        Self {
            drone_id: &grant.drone_id,
            shared_with: &grant.shared_with,
            shared_by: &grant.shared_by,
            access_type: grant.access_type == AccessType::Edit,
        }
    }
}

/// Body of a successful push: the generated child key.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseLocation {
    fn into_candidate(self, id: String) -> LocationCandidate {
        let mut candidate =
            LocationCandidate::new(id, self.name.unwrap_or_default(), self.location.unwrap_or_default());
        candidate.phone = self.phone.and_then(scalar_text);
        candidate.website = self.website.filter(|w| !w.trim().is_empty());
        candidate.code = self.code.and_then(scalar_text);
        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            candidate.set_coordinates(Coordinates::new(latitude, longitude));
        }
        candidate
    }
}

impl FirebaseRepository {
    pub fn new(database_url: String, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn build_url(&self, path: &str) -> String {
        self.build_query_url(path, &[])
    }

    /// Node URL plus query parameters; the auth token, if any, goes last.
    fn build_query_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}.json", self.database_url, path);
        let token = self.auth_token.as_deref().map(|token| ("auth", token));

        for (i, (key, value)) in params.iter().copied().chain(token).enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// GET a node. Firebase answers `null` for paths that do not exist.
    async fn get_node(&self, path: &str) -> Result<Value> {
        self.get_url(path, self.build_url(path)).await
    }

    async fn get_url(&self, path: &str, url: String) -> Result<Value> {
        tracing::debug!("Reading Firebase node {}", path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request for {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firebase read of {} failed with status {}: {}", path, status, body);
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse Firebase response for {}", path))
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get_node(path).await? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .with_context(|| format!("Unexpected record shape at {}", path)),
        }
    }

    /// POST under `path`, returning the generated key.
    async fn push<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<String> {
        let url = self.build_url(path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send push to {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firebase push to {} failed with status {}: {}", path, status, body);
        }

        let pushed = response
            .json::<PushResponse>()
            .await
            .with_context(|| format!("Failed to parse push response from {}", path))?;
        Ok(pushed.name)
    }

    /// PATCH the children named in `body`, leaving the others alone.
    async fn patch<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<()> {
        let url = self.build_url(path);

        let response = self
            .client
            .patch(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send update to {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firebase update of {} failed with status {}: {}", path, status, body);
        }
        Ok(())
    }
}

/// Rocket fields to write. `createdAt` is left out so an update keeps the
/// original creation time.
fn drone_body(drone: &DroneRecord) -> Result<Value> {
    let mut body = serde_json::to_value(drone).context("Failed to encode rocket")?;
    if let Value::Object(fields) = &mut body {
        fields.remove("createdAt");
    }
    Ok(body)
}

/// New rocket body, stamped by the database clock.
fn new_drone_body(drone: &DroneRecord) -> Result<Value> {
    let mut body = drone_body(drone)?;
    if let Value::Object(fields) = &mut body {
        fields.insert("createdAt".to_string(), json!({".sv": "timestamp"}));
    }
    Ok(body)
}

/// Children of a list node. Firebase returns arrays for integer keys
/// (with `null` holes) and objects otherwise.
fn children(node: Value) -> Vec<(String, Value)> {
    match node {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map.into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Decode each child, skipping (and logging) the ones that do not fit.
fn decode_children<T: DeserializeOwned>(node: Value, path: &str) -> Vec<(String, T)> {
    children(node)
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                tracing::warn!("Skipping malformed record {}/{}: {}", path, key, e);
                None
            }
        })
        .collect()
}

fn scalar_text(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl LaunchRepository for FirebaseRepository {
    async fn fetch_reference_locations(&self) -> Result<Vec<LocationCandidate>> {
        let node = self.get_node(LOCATIONS).await?;
        let locations: Vec<LocationCandidate> = decode_children::<FirebaseLocation>(node, LOCATIONS)
            .into_iter()
            .map(|(key, location)| location.into_candidate(key))
            .collect();

        tracing::debug!("Fetched {} reference locations", locations.len());
        Ok(locations)
    }

    async fn fetch_drone_by_id(&self, drone_id: &str) -> Result<Option<DroneRecord>> {
        let path = format!("{}/{}", DRONES, urlencoding::encode(drone_id));
        self.get_optional(&path).await
    }

    async fn fetch_drones_by_owner(&self, owner_id: &str) -> Result<Vec<(String, DroneRecord)>> {
        let owner = format!("\"{}\"", owner_id);
        let url = self.build_query_url(DRONES, &[("orderBy", "\"userId\""), ("equalTo", owner.as_str())]);
        let node = self.get_url(DRONES, url).await?;

        // Query results come back as an unordered object; push keys sort by creation
        let mut drones = decode_children::<DroneRecord>(node, DRONES);
        drones.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(drones)
    }

    async fn insert_drone(&self, drone: &DroneRecord) -> Result<String> {
        let key = self.push(DRONES, &new_drone_body(drone)?).await?;
        tracing::debug!("Stored rocket {}", key);
        Ok(key)
    }

    async fn update_drone(&self, drone_id: &str, drone: &DroneRecord) -> Result<()> {
        let path = format!("{}/{}", DRONES, urlencoding::encode(drone_id));
        self.patch(&path, &drone_body(drone)?).await
    }

    async fn fetch_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let path = format!("{}/{}", USERS, urlencoding::encode(user_id));
        self.get_optional(&path).await
    }

    async fn fetch_all_share_grants(&self) -> Result<Vec<ShareGrant>> {
        let node = self.get_node(SHARED_DRONES).await?;
        Ok(decode_children::<ShareGrant>(node, SHARED_DRONES)
            .into_iter()
            .map(|(_, grant)| grant)
            .collect())
    }

    async fn insert_share_grant(&self, grant: &ShareGrant) -> Result<()> {
        let key = self.push(SHARED_DRONES, &StoredGrant::from(grant)).await?;
        tracing::debug!("Stored share grant {}", key);
        Ok(())
    }

    async fn push_flight(&self, flight: &FlightRecord) -> Result<String> {
        self.push(FLIGHTS, flight).await
    }

    async fn fetch_flight_by_id(&self, flight_id: &str) -> Result<Option<FlightRecord>> {
        let path = format!("{}/{}", FLIGHTS, urlencoding::encode(flight_id));
        self.get_optional(&path).await
    }

    async fn update_flight(&self, flight_id: &str, flight: &FlightRecord) -> Result<()> {
        let path = format!("{}/{}", FLIGHTS, urlencoding::encode(flight_id));
        self.patch(&path, flight).await
    }

    // The flights node is not indexed by droneId, so filter client-side
    async fn fetch_flights_by_drone_id(&self, drone_id: &str) -> Result<Vec<StoredFlight>> {
        let node = self.get_node(FLIGHTS).await?;
        Ok(decode_children::<FlightRecord>(node, FLIGHTS)
            .into_iter()
            .filter(|(_, record)| record.drone_id == drone_id)
            .map(|(id, record)| StoredFlight { id, record })
            .collect())
    }
}
