// Google Geocoding API client
use crate::application::launch_repository::{GeocodeError, Geocoder};
use crate::domain::geo::Coordinates;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(base_url: String, api_key: String, language: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            language,
        }
    }

    fn build_query_url(&self, text: &str) -> String {
        format!(
            "{}?address={}&key={}&language={}",
            self.base_url,
            urlencoding::encode(text),
            urlencoding::encode(&self.api_key),
            self.language
        )
    }
}

/// First result wins; ZERO_RESULTS and an empty result list are misses,
/// every other non-OK status is a service failure.
fn first_match(text: &str, response: GeocodeResponse) -> Result<Coordinates, GeocodeError> {
    match response.status.as_str() {
        "OK" => response
            .results
            .into_iter()
            .next()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))
            .ok_or_else(|| GeocodeError::NotFound(text.to_string())),
        "ZERO_RESULTS" => Err(GeocodeError::NotFound(text.to_string())),
        status => Err(GeocodeError::Transport(anyhow::anyhow!(
            "geocoder returned {}: {}",
            status,
            response.error_message.unwrap_or_default()
        ))),
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, text: &str) -> Result<Coordinates, GeocodeError> {
        if text.trim().is_empty() {
            return Err(GeocodeError::NotFound(text.to_string()));
        }

        let url = self.build_query_url(text);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to geocoding service")?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GeocodeError::Transport(anyhow::anyhow!(
                "geocoding request failed with status {}",
                status
            )));
        }

        let data = response
            .json::<GeocodeResponse>()
            .await
            .context("Failed to parse geocoding response")?;

        first_match(text, data)
    }
}
