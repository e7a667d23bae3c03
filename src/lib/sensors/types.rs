use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TEMPERATURE_RANGE: (f64, f64) = (20.0, 85.0);
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);
pub const LIGHT_RANGE: (f64, f64) = (0.0, 100_000.0);
pub const VIBRATION_RANGE: (f64, f64) = (0.0, 10.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
}

/// One composite reading, rebuilt on every poll.
///
/// The `Option` fields are the raw readers' results, `None` (JSON `null`)
/// meaning the device could not be read, which is different from zero.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReading {
    /// °C
    pub temperature: f64,
    /// Battery level standing in for humidity, 0-100
    pub humidity: f64,
    /// lux
    pub light: f64,
    /// Unitless intensity, 0-10
    pub vibration: f64,
    pub status: Status,
    pub battery_level: Option<u32>,
    pub battery_temp: Option<f64>,
    pub cpu_temp: Option<f64>,
    pub cpu_usage: Option<f64>,
    /// MB
    pub ram_usage: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Outputs of the raw metric readers for one poll
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawReadings {
    pub battery_level: Option<u32>,
    pub battery_temp: Option<f64>,
    pub cpu_temp: Option<f64>,
    pub cpu_usage: Option<f64>,
    pub ram_usage: Option<f64>,
    pub light: Option<f64>,
}

pub fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}
