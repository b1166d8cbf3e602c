// Drone registry - an owner's own rockets: listing, creation and edits
use crate::application::launch_repository::LaunchRepository;
use crate::domain::drone::{DroneRecord, DroneRecordError, OwnedDroneView};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DroneError {
    #[error(transparent)]
    Invalid(#[from] DroneRecordError),

    #[error("rocket {0} not found")]
    NotFound(String),

    #[error("rocket {drone_id} belongs to another owner")]
    NotOwner { drone_id: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct DroneRegistry {
    repository: Arc<dyn LaunchRepository>,
}

impl DroneRegistry {
    pub fn new(repository: Arc<dyn LaunchRepository>) -> Self {
        Self { repository }
    }

    /// The owner's rockets numbered `#01`, `#02`, ... by creation order.
    /// A store failure reads as an empty list.
    pub async fn drones_for_owner(&self, owner_id: &str) -> Vec<OwnedDroneView> {
        match self.repository.fetch_drones_by_owner(owner_id).await {
            Ok(drones) => drones
                .into_iter()
                .enumerate()
                .map(|(position, (id, drone))| OwnedDroneView::new(position, id, drone))
                .collect(),
            Err(e) => {
                tracing::error!("Error fetching rockets of {}: {:#}", owner_id, e);
                Vec::new()
            }
        }
    }

    pub async fn register_drone(&self, owner_id: &str, drone: DroneRecord) -> Result<String, DroneError> {
        let drone = owned_by(owner_id, drone)?;
        let id = self.repository.insert_drone(&drone).await?;
        tracing::info!("Registered rocket {} for {}", id, owner_id);
        Ok(id)
    }

    /// Overwrite a rocket's fields. Only its owner may do so; the creation
    /// time is kept.
    pub async fn update_drone(&self, drone_id: &str, owner_id: &str, drone: DroneRecord) -> Result<(), DroneError> {
        let mut drone = owned_by(owner_id, drone)?;

        let existing = self
            .repository
            .fetch_drone_by_id(drone_id)
            .await?
            .ok_or_else(|| DroneError::NotFound(drone_id.to_string()))?;
        if existing.user_id.as_deref() != Some(owner_id) {
            return Err(DroneError::NotOwner {
                drone_id: drone_id.to_string(),
            });
        }

        drone.created_at = existing.created_at;
        self.repository.update_drone(drone_id, &drone).await?;
        tracing::info!("Updated rocket {}", drone_id);
        Ok(())
    }
}

fn owned_by(owner_id: &str, mut drone: DroneRecord) -> Result<DroneRecord, DroneRecordError> {
    if owner_id.trim().is_empty() {
        return Err(DroneRecordError::MissingField("ownerId"));
    }
    drone.check_complete()?;
    drone.user_id = Some(owner_id.to_string());
    drone.created_at = None;
    Ok(drone)
}
