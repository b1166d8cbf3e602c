// Application layer - use cases over the collaborator traits
pub mod drone_service;
pub mod flight_service;
pub mod launch_repository;
pub mod location_service;
pub mod sharing_service;
pub mod stopwatch;

#[cfg(test)]
pub mod fakes;
