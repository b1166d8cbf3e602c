// Shared-access resolver - rockets other owners have shared with a viewer
use crate::application::launch_repository::LaunchRepository;
use crate::domain::drone::{AccessType, ShareGrant, SharedDroneView, UNKNOWN_OWNER};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("an email address is required to share a rocket")]
    EmptyEmail,

    #[error("rocket {drone_id} is already shared with {email}")]
    AlreadyShared { drone_id: String, email: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct SharedAccessResolver {
    repository: Arc<dyn LaunchRepository>,
}

impl SharedAccessResolver {
    pub fn new(repository: Arc<dyn LaunchRepository>) -> Self {
        Self { repository }
    }

    /// Views for every grant addressed to `viewer_email`. Grants whose rocket
    /// cannot be read are dropped; an unreadable owner profile only blanks
    /// the owner name. Nothing here fails the whole batch.
    pub async fn resolve_shared_with(
        &self,
        viewer_email: &str,
        all_grants: Vec<ShareGrant>,
    ) -> Vec<SharedDroneView> {
        let addressed: Vec<ShareGrant> = all_grants
            .into_iter()
            .filter(|grant| grant.is_addressed_to(viewer_email))
            .collect();

        tracing::debug!("Resolving {} grants shared with {}", addressed.len(), viewer_email);

        let views = addressed
            .into_iter()
            .enumerate()
            .map(|(position, grant)| self.resolve_grant(position, grant));

        join_all(views).await.into_iter().flatten().collect()
    }

    /// Reads every grant from the store, then resolves the viewer's share.
    pub async fn shared_with_viewer(&self, viewer_email: &str) -> Vec<SharedDroneView> {
        match self.repository.fetch_all_share_grants().await {
            Ok(grants) => self.resolve_shared_with(viewer_email, grants).await,
            Err(e) => {
                tracing::error!("Error fetching share grants: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn resolve_grant(&self, position: usize, grant: ShareGrant) -> Option<SharedDroneView> {
        let drone = match self.repository.fetch_drone_by_id(&grant.drone_id).await {
            Ok(Some(drone)) => drone,
            Ok(None) => {
                tracing::debug!("Shared rocket {} no longer exists", grant.drone_id);
                return None;
            }
            Err(e) => {
                tracing::warn!("Error fetching shared rocket {}: {:#}", grant.drone_id, e);
                return None;
            }
        };

        let owner_name = match drone.user_id.as_deref() {
            Some(owner_id) => self.owner_name(owner_id).await,
            None => UNKNOWN_OWNER.to_string(),
        };

        Some(SharedDroneView::new(position, grant, drone, owner_name))
    }

    async fn owner_name(&self, owner_id: &str) -> String {
        match self.repository.fetch_user_by_id(owner_id).await {
            Ok(Some(profile)) => profile.display_name.unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            Ok(None) => UNKNOWN_OWNER.to_string(),
            Err(e) => {
                tracing::warn!("Error fetching owner {}: {:#}", owner_id, e);
                UNKNOWN_OWNER.to_string()
            }
        }
    }

    /// Grants `email` access to a rocket, once per recipient.
    pub async fn share_drone(
        &self,
        drone_id: &str,
        owner_id: &str,
        email: &str,
        access_type: AccessType,
    ) -> Result<ShareGrant, ShareError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ShareError::EmptyEmail);
        }

        let existing = self.repository.fetch_all_share_grants().await?;
        if existing
            .iter()
            .any(|grant| grant.drone_id == drone_id && grant.is_addressed_to(email))
        {
            return Err(ShareError::AlreadyShared {
                drone_id: drone_id.to_string(),
                email: email.to_string(),
            });
        }

        let grant = ShareGrant::new(drone_id, email, owner_id, access_type);
        self.repository.insert_share_grant(&grant).await?;
        tracing::info!("Shared rocket {} with {} ({:?})", drone_id, email, access_type);
        Ok(grant)
    }
}
