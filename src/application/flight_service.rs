// Flight record assembler - joins the form steps, stopwatch time and weather
use crate::application::launch_repository::{GeocodeError, Geocoder, LaunchRepository, WeatherProvider};
use crate::domain::flight::{FlightDraft, FlightMeasurements, FlightRecord, FlightRecordError, StoredFlight, Weather};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordFlightError {
    #[error(transparent)]
    Invalid(#[from] FlightRecordError),

    #[error("flight {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum WeatherLookupError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("weather lookup failed: {0:#}")]
    Provider(anyhow::Error),
}

#[derive(Clone)]
pub struct FlightRecordAssembler {
    repository: Arc<dyn LaunchRepository>,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
}

impl FlightRecordAssembler {
    pub fn new(
        repository: Arc<dyn LaunchRepository>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            repository,
            geocoder,
            weather,
        }
    }

    /// Validate and persist a flight, returning its store id.
    pub async fn record_flight(
        &self,
        draft: FlightDraft,
        measurements: FlightMeasurements,
    ) -> Result<String, RecordFlightError> {
        let record = FlightRecord::assemble(draft, measurements)?;
        let id = self.repository.push_flight(&record).await?;
        tracing::info!(
            "Recorded flight {} for rocket {} ({}s, {:.1} m, {:?} g)",
            id,
            record.drone_id,
            record.flight_time,
            record.altitude_meters(),
            record.drone_mass_grams()
        );
        Ok(id)
    }

    /// Replace a logged flight with the edited form, validated like a new one.
    pub async fn update_flight(
        &self,
        flight_id: &str,
        draft: FlightDraft,
        measurements: FlightMeasurements,
    ) -> Result<(), RecordFlightError> {
        let record = FlightRecord::assemble(draft, measurements)?;
        if self.repository.fetch_flight_by_id(flight_id).await?.is_none() {
            return Err(RecordFlightError::NotFound(flight_id.to_string()));
        }

        self.repository.update_flight(flight_id, &record).await?;
        tracing::info!("Updated flight {} for rocket {}", flight_id, record.drone_id);
        Ok(())
    }

    /// A rocket's flight log. Store failures read as an empty log.
    pub async fn flights_for_drone(&self, drone_id: &str) -> Vec<StoredFlight> {
        match self.repository.fetch_flights_by_drone_id(drone_id).await {
            Ok(flights) => flights,
            Err(e) => {
                tracing::error!("Error fetching flights for rocket {}: {:#}", drone_id, e);
                Vec::new()
            }
        }
    }

    /// Current conditions at a place typed into the flight form.
    pub async fn weather_for(&self, location: &str) -> Result<Weather, WeatherLookupError> {
        let at = self.geocoder.geocode(location).await?;
        let weather = self
            .weather
            .current_weather(at)
            .await
            .map_err(WeatherLookupError::Provider)?;

        tracing::debug!(
            "Weather at {}: {:?} C, {} mm rain",
            location,
            weather.temperature_c,
            weather.precipitation_or_dry()
        );
        Ok(weather)
    }
}
