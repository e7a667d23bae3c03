pub mod battery;
pub mod cpu;
pub mod diagnostics;
pub mod history;
pub mod light;
pub mod memory;
pub mod patterns;
pub mod reader;
pub mod thermal;
pub mod types;
pub mod vibration;

pub use reader::SensorReader;
pub use types::{DeviceReading, Status};
