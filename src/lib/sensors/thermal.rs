use tracing::*;

use crate::bridge::Bridge;

pub const COMMAND: &str = "cat /sys/class/thermal/thermal_zone*/temp 2>/dev/null";

const PLAUSIBLE_RANGE: (f64, f64) = (20.0, 100.0);

/// Zones report either whole degrees or milli-degrees
pub fn normalize(raw: f64) -> f64 {
    if raw > 1000.0 {
        raw / 1000.0
    } else {
        raw
    }
}

/// Hottest plausible zone, one raw reading per line
pub fn parse(output: &str) -> Option<f64> {
    let (min, max) = PLAUSIBLE_RANGE;

    output
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .filter(|raw| raw.is_finite() && *raw > 0.0)
        .map(normalize)
        .filter(|temperature| (min..=max).contains(temperature))
        .reduce(f64::max)
}

#[instrument(level = "debug", skip(bridge))]
pub async fn read_cpu_temperature(bridge: &dyn Bridge) -> Option<f64> {
    match bridge.shell(COMMAND).await {
        Ok(output) => parse(&output),
        Err(error) => {
            debug!("Failed reading thermal zones: {error}");
            None
        }
    }
}
