// Measurement units offered by the flight and rocket forms
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const FEET_PER_METER: f64 = 3.280_84;
const GRAMS_PER_POUND: f64 = 453.592_37;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltitudeUnit {
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft")]
    Feet,
}

impl AltitudeUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            Self::Meters => value,
            Self::Feet => value / FEET_PER_METER,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassUnit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "lbs")]
    Pounds,
}

impl MassUnit {
    pub fn to_grams(self, value: f64) -> f64 {
        match self {
            Self::Grams => value,
            Self::Pounds => value * GRAMS_PER_POUND,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    #[serde(rename = "deg")]
    Degrees,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Am,
    Pm,
}

impl TimeUnit {
    pub fn from_hour(hour: u32) -> Self {
        if hour >= 12 { Self::Pm } else { Self::Am }
    }
}

/// 12-hour `HH:MM` plus its am/pm half, e.g. 00:05 -> ("12:05", Am).
pub fn twelve_hour_clock(time: NaiveTime) -> (String, TimeUnit) {
    let hour = match time.hour() % 12 {
        0 => 12,
        h => h,
    };
    (format!("{:02}:{:02}", hour, time.minute()), TimeUnit::from_hour(time.hour()))
}

/// Launch date as `DD/MM/YYYY`.
pub fn flight_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
