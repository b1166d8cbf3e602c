// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::drone_service::DroneRegistry;
use crate::application::flight_service::FlightRecordAssembler;
use crate::application::location_service::LocationAggregator;
use crate::application::sharing_service::SharedAccessResolver;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::firebase_repository::FirebaseRepository;
use crate::infrastructure::google_geocoder::GoogleGeocoder;
use crate::infrastructure::openweather::OpenWeatherClient;
use crate::presentation::app_state::{AppState, StopwatchSessions};
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("star_launch=info,tower_http=info")),
        )
        .init();

    let app_config = load_app_config().context("Failed to load configuration")?;

    // Infrastructure layer
    let repository = Arc::new(FirebaseRepository::new(
        app_config.firebase.database_url,
        app_config.firebase.auth_token,
    ));
    let geocoder = Arc::new(GoogleGeocoder::new(
        app_config.geocoding.base_url,
        app_config.geocoding.api_key,
        app_config.geocoding.language,
    ));
    let weather = Arc::new(OpenWeatherClient::new(
        app_config.weather.base_url,
        app_config.weather.api_key,
    ));

    // Application layer
    let state = Arc::new(AppState {
        locations: LocationAggregator::new(
            repository.clone(),
            geocoder.clone(),
            app_config.locations.nearby_radius_meters,
        ),
        sharing: SharedAccessResolver::new(repository.clone()),
        drones: DroneRegistry::new(repository.clone()),
        flights: FlightRecordAssembler::new(repository, geocoder, weather),
        stopwatches: Arc::new(StopwatchSessions::new(
            app_config.stopwatch.tick(),
            app_config.stopwatch.max_session(),
        )),
    });

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = app_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_addr))?;
    tracing::info!("Starting star-launch service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
