// OpenWeatherMap current-conditions client
use crate::application::launch_repository::WeatherProvider;
use crate::domain::flight::Weather;
use crate::domain::geo::Coordinates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    main: Option<MainReadings>,
    #[serde(default)]
    wind: Option<WindReadings>,
    #[serde(default)]
    rain: Option<RainReadings>,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: Option<f64>,
    gust: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainReadings {
    #[serde(rename = "1h")]
    last_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}

impl From<CurrentWeather> for Weather {
    fn from(current: CurrentWeather) -> Self {
        let (temperature_c, pressure_hpa, humidity_pct) = match current.main {
            Some(m) => (m.temp, m.pressure, m.humidity),
            None => (None, None, None),
        };
        let (wind_speed_ms, wind_gust_ms, wind_direction_deg) = match current.wind {
            Some(w) => (w.speed, w.gust, w.deg),
            None => (None, None, None),
        };

        Weather {
            temperature_c,
            pressure_hpa,
            humidity_pct,
            wind_speed_ms,
            wind_gust_ms,
            wind_direction_deg,
            precipitation_mm_1h: current.rain.and_then(|r| r.last_hour),
            description: current.weather.into_iter().find_map(|c| c.description),
        }
    }
}

impl OpenWeatherClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn build_query_url(&self, at: Coordinates) -> String {
        format!(
            "{}?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            at.latitude,
            at.longitude,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, at: Coordinates) -> Result<Weather> {
        let url = self.build_query_url(at);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to weather service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Weather query failed with status {}: {}", status, body);
        }

        let current = response
            .json::<CurrentWeather>()
            .await
            .context("Failed to parse weather response")?;

        Ok(current.into())
    }
}
