// Device position reported by the client with its request
use crate::application::launch_repository::DeviceLocation;
use crate::domain::geo::Coordinates;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDeviceLocation {
    position: Option<Coordinates>,
}

impl FixedDeviceLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    /// Both query parameters are needed for a usable fix.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Self::new(Some(Coordinates::new(lat, lon)))
            }
            _ => Self::new(None),
        }
    }
}

#[async_trait]
impl DeviceLocation for FixedDeviceLocation {
    async fn current_location(&self) -> Option<Coordinates> {
        self.position
    }
}
