use tracing::*;

use super::patterns::{first_number, OrderedPatterns};
use crate::bridge::Bridge;

pub const COMMAND: &str = "dumpsys battery";

lazy_static! {
    // Reported in tenths of a degree Celsius
    static ref TEMPERATURE: OrderedPatterns<f64> =
        OrderedPatterns::new(&[(r"temperature: (\d+)", first_number)])
            .expect("Invalid battery temperature pattern");
    static ref LEVEL: OrderedPatterns<f64> =
        OrderedPatterns::new(&[(r"level: (\d+)", first_number)])
            .expect("Invalid battery level pattern");
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatteryStatus {
    /// Percent
    pub level: Option<u32>,
    /// °C
    pub temperature: Option<f64>,
}

pub fn parse(output: &str) -> BatteryStatus {
    BatteryStatus {
        level: LEVEL.first_match(output).map(|level| level as u32),
        temperature: TEMPERATURE
            .first_match(output)
            .map(|temperature| temperature / 10.0),
    }
}

/// Level and temperature from a single `dumpsys battery` call
#[instrument(level = "debug", skip(bridge))]
pub async fn read(bridge: &dyn Bridge) -> BatteryStatus {
    match bridge.shell(COMMAND).await {
        Ok(output) => parse(&output),
        Err(error) => {
            debug!("Failed reading battery: {error}");
            BatteryStatus::default()
        }
    }
}
