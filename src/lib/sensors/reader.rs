use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::*;

use super::{
    battery, cpu, light, memory, thermal,
    types::{
        clamp, DeviceReading, RawReadings, Status, LIGHT_RANGE, PERCENT_RANGE, TEMPERATURE_RANGE,
        VIBRATION_RANGE,
    },
    vibration::VibrationEstimator,
};
use crate::bridge::Bridge;

pub const DEFAULT_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_HUMIDITY: f64 = 50.0;
pub const DEFAULT_LIGHT: f64 = 100.0;

const WARNING_TEMPERATURE: f64 = 65.0;
const WARNING_VIBRATION: f64 = 5.0;

/// Map the raw readings onto the dashboard schema, applying defaults and clamps
pub fn compose(raw: &RawReadings, vibration: f64, timestamp: DateTime<Utc>) -> DeviceReading {
    let temperature = raw
        .cpu_temp
        .or(raw.battery_temp)
        .unwrap_or(DEFAULT_TEMPERATURE);
    let humidity = raw
        .battery_level
        .map(f64::from)
        .unwrap_or(DEFAULT_HUMIDITY);

    let temperature = clamp(temperature, TEMPERATURE_RANGE);
    let vibration = clamp(vibration, VIBRATION_RANGE);

    let status = if temperature > WARNING_TEMPERATURE || vibration > WARNING_VIBRATION {
        Status::Warning
    } else {
        Status::Normal
    };

    DeviceReading {
        temperature,
        humidity: clamp(humidity, PERCENT_RANGE),
        light: clamp(raw.light.unwrap_or(DEFAULT_LIGHT), LIGHT_RANGE),
        vibration,
        status,
        battery_level: raw.battery_level,
        battery_temp: raw.battery_temp,
        cpu_temp: raw.cpu_temp,
        cpu_usage: raw.cpu_usage,
        ram_usage: raw.ram_usage,
        timestamp,
    }
}

/// Reads every device metric through one bridge.
///
/// Owns the vibration state; the mutex is held across the accelerometer read
/// so overlapping requests update the rolling history one at a time.
pub struct SensorReader {
    bridge: Arc<dyn Bridge>,
    vibration: Mutex<VibrationEstimator>,
}

impl SensorReader {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self::with_estimator(bridge, VibrationEstimator::new())
    }

    pub fn with_estimator(bridge: Arc<dyn Bridge>, estimator: VibrationEstimator) -> Self {
        Self {
            bridge,
            vibration: Mutex::new(estimator),
        }
    }

    pub fn bridge(&self) -> &dyn Bridge {
        self.bridge.as_ref()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn read_raw(&self) -> RawReadings {
        let bridge = self.bridge();

        let (battery, cpu_temp, cpu_usage, ram_usage, light) = tokio::join!(
            battery::read(bridge),
            thermal::read_cpu_temperature(bridge),
            cpu::read_cpu_usage(bridge),
            memory::read_ram_usage(bridge),
            light::read(bridge),
        );

        RawReadings {
            battery_level: battery.level,
            battery_temp: battery.temperature,
            cpu_temp,
            cpu_usage,
            ram_usage,
            light,
        }
    }

    pub async fn read_vibration(&self) -> f64 {
        let mut estimator = self.vibration.lock().await;
        estimator.read(self.bridge()).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn read(&self) -> DeviceReading {
        let raw = self.read_raw().await;
        let vibration = self.read_vibration().await;

        let reading = compose(&raw, vibration, Utc::now());
        trace!("Reading: {reading:?}");
        reading
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        bridge::{
            error::{BridgeError, Result},
            testing::ScriptedBridge,
        },
        sensors::vibration::{self, AccelerometerSample},
    };

    /// Hands out one accelerometer dump per shell call, yielding first so
    /// concurrent callers get a chance to interleave
    struct SampleSequence {
        dumps: std::sync::Mutex<VecDeque<String>>,
    }

    impl SampleSequence {
        fn new(samples: &[(f64, f64, f64)]) -> Self {
            let dumps = samples
                .iter()
                .map(|(x, y, z)| {
                    format!(
                        "Accelerometer: last 1 events\n 1 (ts=1.0, wall=00:00:00.000) {x:.2}, {y:.2}, {z:.2},\n"
                    )
                })
                .collect();
            Self {
                dumps: std::sync::Mutex::new(dumps),
            }
        }
    }

    #[async_trait]
    impl Bridge for SampleSequence {
        async fn devices(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn shell(&self, command: &str) -> Result<String> {
            tokio::task::yield_now().await;
            let dump = self.dumps.lock().unwrap().pop_front();
            dump.ok_or_else(|| BridgeError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr: String::new(),
            })
        }

        fn program(&self) -> &str {
            "sequence"
        }
    }

    const MOTION: [(f64, f64, f64); 5] = [
        (0.0, 0.0, 9.0),
        (1.0, 0.0, 9.0),
        (3.0, 0.0, 9.0),
        (6.0, 0.0, 9.0),
        (2.0, 0.0, 9.0),
    ];

    fn compose_now(raw: &RawReadings, vibration: f64) -> DeviceReading {
        compose(raw, vibration, Utc::now())
    }

    #[test]
    fn cpu_temperature_is_preferred() {
        let raw = RawReadings {
            cpu_temp: Some(48.0),
            battery_temp: Some(31.0),
            ..Default::default()
        };
        assert_eq!(compose_now(&raw, 0.1).temperature, 48.0);

        let raw = RawReadings {
            battery_temp: Some(31.0),
            ..Default::default()
        };
        assert_eq!(compose_now(&raw, 0.1).temperature, 31.0);
    }

    #[test]
    fn defaults_when_nothing_was_read() {
        let reading = compose_now(&RawReadings::default(), 0.1);

        assert_eq!(reading.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(reading.humidity, DEFAULT_HUMIDITY);
        assert_eq!(reading.light, DEFAULT_LIGHT);
        assert_eq!(reading.status, Status::Normal);
        assert_eq!(reading.battery_level, None);
        assert_eq!(reading.cpu_temp, None);
    }

    #[test]
    fn battery_level_stands_in_for_humidity() {
        let raw = RawReadings {
            battery_level: Some(87),
            ..Default::default()
        };
        assert_eq!(compose_now(&raw, 0.1).humidity, 87.0);
    }

    #[test]
    fn values_are_clamped() {
        let raw = RawReadings {
            cpu_temp: Some(95.0),
            battery_level: Some(140),
            light: Some(250_000.0),
            ..Default::default()
        };
        let reading = compose_now(&raw, 12.0);

        assert_eq!(reading.temperature, 85.0);
        assert_eq!(reading.vibration, 10.0);
        assert_eq!(reading.humidity, 100.0);
        assert_eq!(reading.light, 100_000.0);
        assert_eq!(reading.status, Status::Warning);
        // Raw fields are passed through untouched
        assert_eq!(reading.cpu_temp, Some(95.0));
    }

    #[test]
    fn warning_thresholds() {
        let hot = RawReadings {
            cpu_temp: Some(65.5),
            ..Default::default()
        };
        assert_eq!(compose_now(&hot, 0.1).status, Status::Warning);

        let warm = RawReadings {
            cpu_temp: Some(65.0),
            ..Default::default()
        };
        assert_eq!(compose_now(&warm, 5.0).status, Status::Normal);
        assert_eq!(compose_now(&warm, 5.1).status, Status::Warning);
    }

    #[tokio::test]
    async fn full_read() {
        let bridge = ScriptedBridge::default()
            .with_output(battery::COMMAND, "  level: 64\n  temperature: 298\n")
            .with_output(thermal::COMMAND, "38000\n44000\n")
            .with_output(cpu::TOP_COMMAND, "User 20%, System 5%, IOW 0%, IRQ 0%\n")
            .with_output(
                memory::MEMINFO_COMMAND,
                "MemTotal: 2048000 kB\nMemFree: 100 kB\nMemAvailable: 1024000 kB\n",
            )
            .with_output(light::COMMAND, "Light Sensor\n  last value: 320.0\n")
            .with_output(
                vibration::FILTERED_COMMAND,
                "Accelerometer: last 1 events\n 1 (ts=1.0, wall=00:00:00.000) 0.10, 0.20, 9.81,\n",
            );
        let reader = SensorReader::new(Arc::new(bridge));

        let reading = reader.read().await;
        assert_eq!(reading.temperature, 44.0);
        assert_eq!(reading.humidity, 64.0);
        assert_eq!(reading.light, 320.0);
        assert_eq!(reading.vibration, 0.1);
        assert_eq!(reading.status, Status::Normal);
        assert_eq!(reading.battery_level, Some(64));
        assert_eq!(reading.battery_temp, Some(29.8));
        assert_eq!(reading.cpu_usage, Some(25.0));
        assert_eq!(reading.ram_usage, Some(1000.0));
    }

    #[tokio::test]
    async fn estimator_state_is_injected() {
        let mut estimator = VibrationEstimator::new();
        estimator.update(Some(AccelerometerSample::new(0.0, 0.0, 9.8)));
        estimator.update(Some(AccelerometerSample::new(4.0, 0.0, 9.8)));
        let emitted = estimator.last_value();

        let reader = SensorReader::with_estimator(Arc::new(ScriptedBridge::default()), estimator);
        let value = reader.read_vibration().await;
        assert!((value - emitted * 0.9).abs() < 1e-9, "{value}");
    }

    #[tokio::test]
    async fn overlapping_reads_take_turns() {
        let sequential = SensorReader::new(Arc::new(SampleSequence::new(&MOTION)));
        for _ in MOTION {
            sequential.read_vibration().await;
        }

        let concurrent = SensorReader::new(Arc::new(SampleSequence::new(&MOTION)));
        tokio::join!(
            concurrent.read_vibration(),
            concurrent.read_vibration(),
            concurrent.read_vibration(),
            concurrent.read_vibration(),
            concurrent.read_vibration(),
        );

        let sequential = sequential.vibration.lock().await;
        let concurrent = concurrent.vibration.lock().await;
        assert_eq!(concurrent.history().len(), MOTION.len() - 1);
        assert_eq!(concurrent.history(), sequential.history());
        assert_eq!(concurrent.last_value(), sequential.last_value());
        assert_eq!(concurrent.last_sample(), sequential.last_sample());
    }
}
