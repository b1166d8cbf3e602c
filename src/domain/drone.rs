// Rocket records, owner profiles and share grants
use super::lenient;
use super::units::{AltitudeUnit, MassUnit};
use chrono::DateTime;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Owner name shown when the owner's profile cannot be read.
pub const UNKNOWN_OWNER: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneRecord {
    #[serde(default)]
    pub drone_name: Option<String>,
    #[serde(default)]
    pub drone_type: Option<String>,
    #[serde(default)]
    pub motor_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub altitude_unit: AltitudeUnit,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub flight_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub mass: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub mass_unit: MassUnit,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub launch_angle: Option<f64>,
    /// Server timestamp in epoch milliseconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum DroneRecordError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl DroneRecord {
    /// A rocket card needs every descriptive field and every measurement.
    pub fn check_complete(&self) -> Result<(), DroneRecordError> {
        let texts = [
            ("droneName", &self.drone_name),
            ("droneType", &self.drone_type),
            ("motorType", &self.motor_type),
        ];
        for (field, value) in texts {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                return Err(DroneRecordError::MissingField(field));
            }
        }

        let numbers = [
            ("altitude", self.altitude),
            ("flightTime", self.flight_time),
            ("mass", self.mass),
            ("launchAngle", self.launch_angle),
        ];
        match numbers.into_iter().find(|(_, value)| value.is_none()) {
            Some((field, _)) => Err(DroneRecordError::MissingField(field)),
            None => Ok(()),
        }
    }

    /// Creation day as `DD-MM-YYYY`, the way rocket cards print it.
    pub fn created_on(&self) -> Option<String> {
        let millis = self.created_at?;
        DateTime::from_timestamp_millis(millis).map(|at| at.format("%d-%m-%Y").to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub academics: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessType {
    Edit,
    View,
}

// Older grants were written with a boolean flag (true = Edit).
impl<'de> Deserialize<'de> for AccessType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(AccessType::Edit),
            Repr::Flag(false) => Ok(AccessType::View),
            Repr::Name(name) => match name.as_str() {
                "Edit" => Ok(AccessType::Edit),
                "View" => Ok(AccessType::View),
                other => Err(de::Error::unknown_variant(other, &["Edit", "View"])),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    pub drone_id: String,
    pub shared_with: String,
    pub shared_by: String,
    pub access_type: AccessType,
}

impl ShareGrant {
    pub fn new(
        drone_id: impl Into<String>,
        shared_with: impl Into<String>,
        shared_by: impl Into<String>,
        access_type: AccessType,
    ) -> Self {
        Self {
            drone_id: drone_id.into(),
            shared_with: shared_with.into(),
            shared_by: shared_by.into(),
            access_type,
        }
    }

    /// Exact, case-sensitive match on the recipient's email.
    pub fn is_addressed_to(&self, viewer_email: &str) -> bool {
        self.shared_with == viewer_email
    }
}

/// A rocket as seen by someone it was shared with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDroneView {
    pub id: String,
    pub display_id: String,
    pub owner_name: String,
    pub shared_with: String,
    pub access_type: AccessType,
    pub created_on: Option<String>,
    #[serde(flatten)]
    pub drone: DroneRecord,
}

impl SharedDroneView {
    /// `position` is the grant's zero-based index among the viewer's grants.
    pub fn new(position: usize, grant: ShareGrant, drone: DroneRecord, owner_name: String) -> Self {
        Self {
            id: grant.drone_id,
            display_id: display_id(position),
            owner_name,
            shared_with: grant.shared_with,
            access_type: grant.access_type,
            created_on: drone.created_on(),
            drone,
        }
    }
}

/// One of the owner's own rockets, numbered in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedDroneView {
    pub id: String,
    pub display_id: String,
    pub created_on: Option<String>,
    #[serde(flatten)]
    pub drone: DroneRecord,
}

impl OwnedDroneView {
    pub fn new(position: usize, id: String, drone: DroneRecord) -> Self {
        Self {
            id,
            display_id: display_id(position),
            created_on: drone.created_on(),
            drone,
        }
    }
}

/// `#01`, `#02`, ... for list cards.
pub fn display_id(position: usize) -> String {
    format!("#{:02}", position + 1)
}
