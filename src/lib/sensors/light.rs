use regex::Captures;
use tracing::*;

use super::patterns::{first_number, OrderedPatterns};
use crate::bridge::Bridge;

pub const COMMAND: &str = "dumpsys sensorservice | grep -i -A 50 light";

#[derive(Clone, Copy, Debug, PartialEq)]
enum LuxMatch {
    /// Explicitly labelled value, taken as soon as it is seen
    Exact(f64),
    /// Positional value from an event dump, may be a placeholder zero
    Candidate(f64),
}

lazy_static! {
    static ref LINE: OrderedPatterns<LuxMatch> = OrderedPatterns::new(&[
        (r"(?i)value:\s*([0-9.]+)", exact),
        (r"(?i)([0-9.]+)\s*lux", exact),
        // "1 (ts=3316484.678, wall=20:06:59.099) 22.00, 0.00, 0.00,"
        (r"\(ts=[^)]+\)\s*([0-9.-]+),\s*([0-9.-]+)", candidate),
        // "123.45, 0.0, 0.0"
        (r"^(\d+\.\d+),\s*[-.\d]+,\s*[-.\d]+", candidate),
    ])
    .expect("Invalid light sensor patterns");
}

fn exact(captures: &Captures) -> Option<LuxMatch> {
    first_number(captures).map(LuxMatch::Exact)
}

fn candidate(captures: &Captures) -> Option<LuxMatch> {
    first_number(captures).map(LuxMatch::Candidate)
}

fn starts_light_section(line: &str) -> bool {
    let line = line.to_lowercase();
    line.contains("light") && line.contains("sensor")
}

/// Ambient light in lux from a sensor service dump.
///
/// Scanning starts at the light sensor section. Event values can be zero while
/// the sensor warms up, so a later non-zero candidate replaces an earlier zero.
pub fn parse(output: &str) -> Option<f64> {
    let mut best: Option<f64> = None;

    let section = output
        .lines()
        .skip_while(|line| !starts_light_section(line));

    for line in section {
        match LINE.first_match(line.trim()) {
            Some(LuxMatch::Exact(lux)) => return Some(lux),
            Some(LuxMatch::Candidate(lux)) => {
                if best.map_or(true, |best| best == 0.0 && lux > 0.0) {
                    best = Some(lux);
                }
            }
            None => {}
        }
    }

    best
}

#[instrument(level = "debug", skip(bridge))]
pub async fn read(bridge: &dyn Bridge) -> Option<f64> {
    match bridge.shell(COMMAND).await {
        Ok(output) => parse(&output),
        Err(error) => {
            debug!("Failed reading light sensor: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_value() {
        let output = "0x0000000b) TMD4906 Light Sensor | AMS | ver: 1 | type: android.sensor.light(5)\n\
                      \tlast reading value: 412.5\n";
        assert_eq!(parse(output), Some(412.5));
    }

    #[test]
    fn lux_suffix() {
        let output = "Light sensor status\n  current: 87 lux\n";
        assert_eq!(parse(output), Some(87.0));
    }

    #[test]
    fn nothing_before_the_section_counts() {
        let output = "value: 3.0\nLight Sensor\n  no data\n";
        assert_eq!(parse(output), None);
    }

    #[test]
    fn non_zero_event_replaces_zero() {
        let output = "TMD4906 Light Sensor: last 3 events\n\
                      \t 1 (ts=3316484.1, wall=20:06:59.099) 0.00, 22.00, 0.00,\n\
                      \t 2 (ts=3316485.2, wall=20:07:00.101) 35.00, 22.00, 0.00,\n\
                      \t 3 (ts=3316486.3, wall=20:07:01.104) 48.00, 22.00, 0.00,\n";
        assert_eq!(parse(output), Some(35.0));
    }

    #[test]
    fn csv_rows_are_candidates() {
        let output = "light sensor raw\n0.0, 0.0, 0.0\n120.50, 1.0, 0.0\n";
        assert_eq!(parse(output), Some(120.5));
    }

    #[test]
    fn zero_is_kept_when_nothing_better() {
        let output = "Light Sensor: last 1 events\n 1 (ts=1.0, wall=00:00:00.000) 0.00, 0.00,\n";
        assert_eq!(parse(output), Some(0.0));
    }
}
