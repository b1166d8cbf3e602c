use crate::application::location_service::DEFAULT_NEARBY_RADIUS_M;
use crate::application::stopwatch::{DEFAULT_MAX_SESSION, DEFAULT_TICK};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub firebase: FirebaseSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub locations: LocationSettings,
    #[serde(default)]
    pub stopwatch: StopwatchSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseSettings {
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationSettings {
    #[serde(default = "default_radius")]
    pub nearby_radius_meters: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StopwatchSettings {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    #[serde(default = "default_max_session_secs")]
    pub max_session_secs: u64,
}

impl StopwatchSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn max_session(&self) -> Duration {
        Duration::from_secs(self.max_session_secs.max(1))
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_geocoding_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_radius() -> f64 {
    DEFAULT_NEARBY_RADIUS_M
}

fn default_tick_millis() -> u64 {
    DEFAULT_TICK.as_millis() as u64
}

fn default_max_session_secs() -> u64 {
    DEFAULT_MAX_SESSION.as_secs()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_geocoding_url(),
            language: default_language(),
        }
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_weather_url(),
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            nearby_radius_meters: default_radius(),
        }
    }
}

impl Default for StopwatchSettings {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            max_session_secs: default_max_session_secs(),
        }
    }
}

/// Settings from `config/starlaunch.toml`, overridden by `STARLAUNCH__*`
/// environment variables (e.g. `STARLAUNCH__GEOCODING__API_KEY`).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/starlaunch").required(false))
        .add_source(config::Environment::with_prefix("STARLAUNCH").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    if app_config.locations.nearby_radius_meters < 0.0 {
        anyhow::bail!(
            "locations.nearby_radius_meters must not be negative, got {}",
            app_config.locations.nearby_radius_meters
        );
    }
    Ok(app_config)
}
