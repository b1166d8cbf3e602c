// Flight records and the conditions captured alongside them
use super::lenient;
use super::units::{flight_date, twelve_hour_clock, AltitudeUnit, AngleUnit, MassUnit, TimeUnit};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions at the launch site. Every reading is optional because the
/// provider omits fields it has no data for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub pressure_hpa: Option<f64>,
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub wind_speed_ms: Option<f64>,
    #[serde(default)]
    pub wind_gust_ms: Option<f64>,
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
    #[serde(default)]
    pub precipitation_mm_1h: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Weather {
    /// Rainfall over the last hour; no report means it stayed dry.
    pub fn precipitation_or_dry(&self) -> f64 {
        self.precipitation_mm_1h.unwrap_or(0.0)
    }
}

/// First step of the flight form: when, where and with which rocket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDraft {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub time_unit: TimeUnit,
    pub location: String,
    #[serde(default)]
    pub weather: Option<Weather>,
    pub drone_id: String,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub drone_mass: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub drone_mass_unit: MassUnit,
}

impl FlightDraft {
    /// Stamps the launch date and 12-hour clock time.
    pub fn launched_at(mut self, at: NaiveDateTime) -> Self {
        let (time, time_unit) = twelve_hour_clock(at.time());
        self.date = flight_date(at.date());
        self.time = time;
        self.time_unit = time_unit;
        self
    }

    pub fn is_unstamped(&self) -> bool {
        self.date.trim().is_empty() && self.time.trim().is_empty()
    }
}

/// Second step: what was measured during the flight.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightMeasurements {
    #[serde(default)]
    pub flight_time: u64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub altitude_unit: AltitudeUnit,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub angle_unit: AngleUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub weather: Option<Weather>,
    pub drone_id: String,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub drone_mass: Option<f64>,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub drone_mass_unit: MassUnit,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub altitude: f64,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub altitude_unit: AltitudeUnit,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub angle: f64,
    #[serde(default, deserialize_with = "lenient::unit_or_default")]
    pub angle_unit: AngleUnit,
    /// Whole seconds from the stopwatch.
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub flight_time: u64,
}

/// A flight as read back from the store, keyed by its push id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFlight {
    pub id: String,
    #[serde(flatten)]
    pub record: FlightRecord,
}

#[derive(Debug, Error, PartialEq)]
pub enum FlightRecordError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("flight time must be greater than zero")]
    NonPositiveFlightTime,
}

impl FlightRecord {
    /// Joins both form steps, refusing records the flight log cannot use.
    pub fn assemble(draft: FlightDraft, measurements: FlightMeasurements) -> Result<Self, FlightRecordError> {
        let altitude = measurements.altitude.ok_or(FlightRecordError::MissingField("altitude"))?;
        let angle = measurements.angle.ok_or(FlightRecordError::MissingField("angle"))?;
        if measurements.flight_time == 0 {
            return Err(FlightRecordError::NonPositiveFlightTime);
        }
        require("date", &draft.date)?;
        require("time", &draft.time)?;
        require("location", &draft.location)?;

        Ok(Self {
            date: draft.date,
            time: draft.time,
            time_unit: draft.time_unit,
            location: draft.location,
            weather: draft.weather,
            drone_id: draft.drone_id,
            drone_mass: draft.drone_mass,
            drone_mass_unit: draft.drone_mass_unit,
            altitude,
            altitude_unit: measurements.altitude_unit,
            angle,
            angle_unit: measurements.angle_unit,
            flight_time: measurements.flight_time,
        })
    }

    pub fn altitude_meters(&self) -> f64 {
        self.altitude_unit.to_meters(self.altitude)
    }

    pub fn drone_mass_grams(&self) -> Option<f64> {
        self.drone_mass.map(|mass| self.drone_mass_unit.to_grams(mass))
    }
}

fn require(field: &'static str, value: &str) -> Result<(), FlightRecordError> {
    if value.trim().is_empty() {
        Err(FlightRecordError::MissingField(field))
    } else {
        Ok(())
    }
}
