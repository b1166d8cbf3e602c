// Infrastructure layer - External dependencies and adapters
pub mod chunked_stream;
pub mod config;
pub mod device_location;
pub mod firebase_repository;
pub mod google_geocoder;
pub mod http_response;
pub mod openweather;
