// Domain layer - value types and pure rules, no I/O
pub mod drone;
pub mod flight;
pub mod flight_timer;
pub mod geo;
pub mod lenient;
pub mod location;
pub mod units;
