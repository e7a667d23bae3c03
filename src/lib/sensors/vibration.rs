use regex::Regex;
use ringbuffer::{AllocRingBuffer, RingBuffer};
use tracing::*;

use super::types::{clamp, VIBRATION_RANGE};
use crate::bridge::Bridge;

pub const FILTERED_COMMAND: &str =
    "dumpsys sensorservice | grep -i -A 50 'accelerometer.*last.*events'";
pub const FULL_COMMAND: &str = "dumpsys sensorservice";

/// Samples with any axis at or beyond this magnitude are garbage
const AXIS_SANITY_BOUND: f64 = 50.0;
const HISTORY_SIZE: usize = 5;
const NOISE_FLOOR: f64 = 0.15;
const BASELINE: f64 = 0.1;
const SETTLED: f64 = 0.2;
const SETTLING_DECAY: f64 = 0.95;
const FAILURE_DECAY: f64 = 0.9;
const MAGNITUDE_CHANGE_SCALE: f64 = 0.5;
const OUTPUT_SCALE: f64 = 0.5;

lazy_static! {
    // "6 (ts=3316484.678198057, wall=20:06:59.099) 2.97, 6.78, 6.08,"
    static ref EVENT: Regex =
        Regex::new(r"\d+\s+\([^)]+\)\s+([-\d.]+)\s*,\s*([-\d.]+)\s*,\s*([-\d.]+)\s*,?\s*$")
            .expect("Invalid accelerometer event pattern");
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccelerometerSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelerometerSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn is_sane(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|axis| axis.is_finite() && axis.abs() < AXIS_SANITY_BOUND)
    }

    fn parse_event(line: &str) -> Option<Self> {
        let captures = EVENT.captures(line)?;
        let axis = |group: usize| captures.get(group)?.as_str().parse::<f64>().ok();

        Some(Self::new(axis(1)?, axis(2)?, axis(3)?)).filter(Self::is_sane)
    }
}

fn starts_accelerometer_section(line: &str) -> bool {
    (line.contains("Accelerometer") || line.contains("accelerometer"))
        && line.contains("last")
        && line.contains("events")
}

/// Most recent valid accelerometer event of a sensor service dump
pub fn parse_latest_sample(output: &str) -> Option<AccelerometerSample> {
    output
        .lines()
        .skip_while(|line| !starts_accelerometer_section(line))
        .skip(1)
        .take_while(|line| {
            !(line.trim().starts_with('>') && !line.to_lowercase().contains("accelerometer"))
        })
        .filter_map(AccelerometerSample::parse_event)
        .last()
}

/// Weights applied to the history, newest first
fn weights(len: usize) -> &'static [f64] {
    match len {
        0 => &[],
        1 => &[1.0],
        2 => &[0.6, 0.4],
        3 => &[0.5, 0.3, 0.2],
        4 => &[0.4, 0.3, 0.2, 0.1],
        _ => &[0.4, 0.25, 0.2, 0.1, 0.05],
    }
}

/// Smoothed vibration intensity derived from successive accelerometer samples.
///
/// One instance lives for the whole process; callers must not interleave
/// updates from concurrent requests.
pub struct VibrationEstimator {
    last_sample: AccelerometerSample,
    history: AllocRingBuffer<f64>,
    last_value: f64,
    initialized: bool,
}

impl Default for VibrationEstimator {
    fn default() -> Self {
        Self {
            last_sample: AccelerometerSample::default(),
            history: AllocRingBuffer::new(HISTORY_SIZE),
            last_value: 0.0,
            initialized: false,
        }
    }
}

impl VibrationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    pub fn history(&self) -> Vec<f64> {
        self.history.to_vec()
    }

    pub fn last_sample(&self) -> Option<AccelerometerSample> {
        self.initialized.then_some(self.last_sample)
    }

    /// Feed the latest sample, or `None` when no sample could be read
    pub fn update(&mut self, sample: Option<AccelerometerSample>) -> f64 {
        let Some(sample) = sample else {
            return self.decay();
        };

        if !self.initialized {
            // A single sample says nothing about motion
            self.last_sample = sample;
            self.initialized = true;
            return BASELINE;
        }

        let signal = self.instantaneous(&sample);
        if signal < NOISE_FLOOR {
            return self.settle();
        }

        self.last_sample = sample;
        self.history.push(signal);

        let history = self.history.to_vec();
        let average: f64 = history
            .iter()
            .rev()
            .zip(weights(history.len()))
            .map(|(value, weight)| value * weight)
            .sum();

        self.last_value = clamp(average * OUTPUT_SCALE, VIBRATION_RANGE);
        self.last_value
    }

    /// Degrade towards the baseline when the device could not be read,
    /// never below it
    pub fn decay(&mut self) -> f64 {
        if self.last_value > BASELINE {
            self.last_value = (self.last_value * FAILURE_DECAY).max(BASELINE);
            return self.last_value;
        }
        BASELINE
    }

    fn settle(&mut self) -> f64 {
        if self.last_value > SETTLED {
            self.last_value *= SETTLING_DECAY;
        } else {
            self.last_value = BASELINE;
        }
        self.last_value
    }

    fn instantaneous(&self, sample: &AccelerometerSample) -> f64 {
        let previous = &self.last_sample;
        let delta = AccelerometerSample::new(
            (sample.x - previous.x).abs(),
            (sample.y - previous.y).abs(),
            (sample.z - previous.z).abs(),
        );
        let magnitude_change = (sample.magnitude() - previous.magnitude()).abs();

        delta.magnitude().max(magnitude_change * MAGNITUDE_CHANGE_SCALE)
    }

    /// Read the accelerometer through `bridge` and update the estimate
    #[instrument(level = "debug", skip_all)]
    pub async fn read(&mut self, bridge: &dyn Bridge) -> f64 {
        let output = match bridge.shell(FILTERED_COMMAND).await {
            Ok(output) => output,
            Err(error) => {
                trace!("Filtered sensorservice dump failed, reading it all: {error}");
                match bridge.shell(FULL_COMMAND).await {
                    Ok(output) => output,
                    Err(error) => {
                        debug!("Failed reading accelerometer: {error}");
                        return self.decay();
                    }
                }
            }
        };

        let sample = parse_latest_sample(&output);
        if sample.is_none() {
            trace!("No accelerometer event found");
        }
        self.update(sample)
    }
}
