// HTTP request handlers
use crate::application::drone_service::DroneError;
use crate::application::flight_service::{RecordFlightError, WeatherLookupError};
use crate::application::launch_repository::GeocodeError;
use crate::application::location_service::search_by_text;
use crate::application::sharing_service::ShareError;
use crate::domain::drone::{AccessType, DroneRecord};
use crate::domain::flight::{FlightDraft, FlightMeasurements};
use crate::domain::flight_timer::TimerState;
use crate::infrastructure::chunked_stream::{ndjson_tick_stream, TickLine};
use crate::infrastructure::device_location::FixedDeviceLocation;
use crate::infrastructure::http_response::{accepts_brotli, error_response, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct DeviceQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl DeviceQuery {
    fn device(&self) -> FixedDeviceLocation {
        FixedDeviceLocation::from_parts(self.lat, self.lon)
    }
}

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer: String,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner: String,
}

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub location: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub owner_id: String,
    pub email: String,
    pub access_type: AccessType,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneRequest {
    pub owner_id: String,
    pub drone: DroneRecord,
}

#[derive(Serialize)]
pub struct RegisteredDrone {
    pub id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFlightRequest {
    pub draft: FlightDraft,
    #[serde(default)]
    pub measurements: FlightMeasurements,
    /// When set, the session is stopped and its time overrides `flightTime`.
    /// The session is dropped only once the flight is saved.
    #[serde(default)]
    pub stopwatch_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct EditFlightRequest {
    pub draft: FlightDraft,
    #[serde(default)]
    pub measurements: FlightMeasurements,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFlight {
    pub id: String,
    pub flight_time: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopwatchStatus {
    pub id: u64,
    pub state: TimerState,
    #[serde(flatten)]
    pub tick: TickLine,
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response<Body> {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Resolved launch-site catalog, optionally narrowed by a prefix search
pub async fn list_locations(
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let catalog = state.locations.catalog().await;
    let matches = search_by_text(query.q.as_deref().unwrap_or("").trim(), &catalog);
    respond(StatusCode::OK, &matches, accepts_brotli(&headers)).await
}

pub async fn nearby_locations(
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let nearby = state.locations.nearby_from_device(&query.device()).await;
    respond(StatusCode::OK, &nearby, accepts_brotli(&headers)).await
}

pub async fn location_region(
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.locations.region(&query.device()).await {
        Some(region) => respond(StatusCode::OK, &region, accepts_brotli(&headers)).await,
        None => error_response(StatusCode::NOT_FOUND, "no located launch sites").await,
    }
}

/// Rockets other owners have shared with the viewer
pub async fn shared_with_viewer(
    Query(query): Query<ViewerQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let views = state.sharing.shared_with_viewer(&query.viewer).await;
    respond(StatusCode::OK, &views, accepts_brotli(&headers)).await
}

pub async fn share_drone(
    Path(drone_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShareRequest>,
) -> impl IntoResponse {
    let result = state
        .sharing
        .share_drone(&drone_id, &request.owner_id, &request.email, request.access_type)
        .await;

    match result {
        Ok(grant) => respond(StatusCode::CREATED, &grant, false).await,
        Err(e) => {
            let status = match &e {
                ShareError::EmptyEmail => StatusCode::BAD_REQUEST,
                ShareError::AlreadyShared { .. } => StatusCode::CONFLICT,
                ShareError::Store(_) => {
                    tracing::error!("Error sharing rocket {}: {:#}", drone_id, e);
                    StatusCode::BAD_GATEWAY
                }
            };
            error_response(status, &e.to_string()).await
        }
    }
}

/// The owner's own rockets
pub async fn list_drones(
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let drones = state.drones.drones_for_owner(&query.owner).await;
    respond(StatusCode::OK, &drones, accepts_brotli(&headers)).await
}

pub async fn register_drone(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DroneRequest>,
) -> impl IntoResponse {
    match state.drones.register_drone(&request.owner_id, request.drone).await {
        Ok(id) => respond(StatusCode::CREATED, &RegisteredDrone { id }, false).await,
        Err(e) => drone_error_response(e).await,
    }
}

pub async fn update_drone(
    Path(drone_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DroneRequest>,
) -> impl IntoResponse {
    match state.drones.update_drone(&drone_id, &request.owner_id, request.drone).await {
        Ok(()) => respond(StatusCode::OK, &RegisteredDrone { id: drone_id }, false).await,
        Err(e) => drone_error_response(e).await,
    }
}

async fn drone_error_response(e: DroneError) -> Response<Body> {
    let status = match &e {
        DroneError::Invalid(_) => StatusCode::BAD_REQUEST,
        DroneError::NotFound(_) => StatusCode::NOT_FOUND,
        DroneError::NotOwner { .. } => StatusCode::FORBIDDEN,
        DroneError::Store(err) => {
            tracing::error!("Error saving rocket: {:#}", err);
            return error_response(StatusCode::BAD_GATEWAY, "could not save the rocket").await;
        }
    };
    error_response(status, &e.to_string()).await
}

pub async fn drone_flights(
    Path(drone_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let flights = state.flights.flights_for_drone(&drone_id).await;
    respond(StatusCode::OK, &flights, accepts_brotli(&headers)).await
}

pub async fn record_flight(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordFlightRequest>,
) -> impl IntoResponse {
    let mut measurements = request.measurements;
    if let Some(stopwatch_id) = request.stopwatch_id {
        match state.stopwatches.stop(stopwatch_id) {
            Some(elapsed) => measurements.flight_time = elapsed,
            None => return error_response(StatusCode::NOT_FOUND, "unknown stopwatch").await,
        }
    }

    let mut draft = request.draft;
    if draft.is_unstamped() {
        draft = draft.launched_at(Local::now().naive_local());
    }

    let flight_time = measurements.flight_time;
    match state.flights.record_flight(draft, measurements).await {
        Ok(id) => {
            // A rejected flight leaves the stopped session for a retry
            if let Some(stopwatch_id) = request.stopwatch_id {
                state.stopwatches.discard(stopwatch_id);
            }
            respond(StatusCode::CREATED, &RecordedFlight { id, flight_time }, false).await
        }
        Err(e) => flight_error_response(e).await,
    }
}

pub async fn edit_flight(
    Path(flight_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EditFlightRequest>,
) -> impl IntoResponse {
    let flight_time = request.measurements.flight_time;
    match state.flights.update_flight(&flight_id, request.draft, request.measurements).await {
        Ok(()) => respond(StatusCode::OK, &RecordedFlight { id: flight_id, flight_time }, false).await,
        Err(e) => flight_error_response(e).await,
    }
}

async fn flight_error_response(e: RecordFlightError) -> Response<Body> {
    match e {
        RecordFlightError::Invalid(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()).await,
        RecordFlightError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &e.to_string()).await,
        RecordFlightError::Store(e) => {
            tracing::error!("Error saving flight: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, "could not save the flight").await
        }
    }
}

/// Current conditions at a typed-in launch site
pub async fn weather_at(
    Query(query): Query<WeatherQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.flights.weather_for(&query.location).await {
        Ok(weather) => respond(StatusCode::OK, &weather, false).await,
        Err(WeatherLookupError::Geocode(GeocodeError::NotFound(place))) => {
            error_response(StatusCode::NOT_FOUND, &format!("unknown place '{}'", place)).await
        }
        Err(e) => {
            tracing::error!("Error looking up weather for {}: {}", query.location, e);
            error_response(StatusCode::BAD_GATEWAY, &e.to_string()).await
        }
    }
}

pub async fn start_stopwatch(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.stopwatches.start();
    let status = StopwatchStatus {
        id,
        state: TimerState::Running,
        tick: TickLine::new(0),
    };
    respond(StatusCode::CREATED, &status, false).await
}

pub async fn stopwatch_status(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let status = state.stopwatches.with(id, |stopwatch| StopwatchStatus {
        id,
        state: stopwatch.state(),
        tick: TickLine::new(stopwatch.elapsed_seconds()),
    });

    match status {
        Some(status) => respond(StatusCode::OK, &status, false).await,
        None => error_response(StatusCode::NOT_FOUND, "unknown stopwatch").await,
    }
}

/// Progressive elapsed-time updates until the session stops
pub async fn stream_stopwatch(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(updates) = state.stopwatches.with(id, |stopwatch| stopwatch.subscribe()) else {
        return error_response(StatusCode::NOT_FOUND, "unknown stopwatch").await;
    };

    match ndjson_tick_stream(updates) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn stop_stopwatch(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.stopwatches.finish(id) {
        Some(elapsed) => {
            let status = StopwatchStatus {
                id,
                state: TimerState::Stopped,
                tick: TickLine::new(elapsed),
            };
            respond(StatusCode::OK, &status, false).await
        }
        None => error_response(StatusCode::NOT_FOUND, "unknown stopwatch").await,
    }
}

pub async fn discard_stopwatch(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    if state.stopwatches.discard(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, "unknown stopwatch").await
    }
}
