use chrono::{DateTime, Utc};
use ringbuffer::{AllocRingBuffer, RingBuffer};
use serde::Serialize;

use super::types::DeviceReading;

pub const WINDOW_SIZE: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub readings: Vec<f64>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Last [`WINDOW_SIZE`] values of one metric
pub struct MetricHistory {
    readings: AllocRingBuffer<f64>,
    last_update: Option<DateTime<Utc>>,
}

impl Default for MetricHistory {
    fn default() -> Self {
        Self {
            readings: AllocRingBuffer::new(WINDOW_SIZE),
            last_update: None,
        }
    }
}

impl MetricHistory {
    pub fn push(&mut self, value: f64, timestamp: DateTime<Utc>) {
        self.readings.push(value);
        self.last_update = Some(timestamp);
    }

    pub fn summary(&self) -> MetricSummary {
        let readings = self.readings.to_vec();

        let (min, max, avg) = if readings.is_empty() {
            (None, None, None)
        } else {
            let min = readings.iter().copied().fold(f64::INFINITY, f64::min);
            let max = readings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = readings.iter().sum::<f64>() / readings.len() as f64;
            (Some(min), Some(max), Some(avg))
        };

        MetricSummary {
            min,
            max,
            avg,
            readings,
            last_update: self.last_update,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistorySummary {
    pub temperature: MetricSummary,
    pub humidity: MetricSummary,
    pub light: MetricSummary,
    pub vibration: MetricSummary,
}

/// Rolling statistics of the readings served to the dashboard
#[derive(Default)]
pub struct ReadingHistory {
    temperature: MetricHistory,
    humidity: MetricHistory,
    light: MetricHistory,
    vibration: MetricHistory,
}

impl ReadingHistory {
    pub fn push(&mut self, reading: &DeviceReading) {
        let timestamp = reading.timestamp;
        self.temperature.push(reading.temperature, timestamp);
        self.humidity.push(reading.humidity, timestamp);
        self.light.push(reading.light, timestamp);
        self.vibration.push(reading.vibration, timestamp);
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            temperature: self.temperature.summary(),
            humidity: self.humidity.summary(),
            light: self.light.summary(),
            vibration: self.vibration.summary(),
        }
    }
}
