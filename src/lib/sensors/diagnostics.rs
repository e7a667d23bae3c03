use serde::Serialize;
use tracing::*;

use super::{cpu, memory};
use crate::bridge::{error::BridgeError, Bridge};

pub const THERMAL_HEAD_COMMAND: &str =
    "cat /sys/class/thermal/thermal_zone*/temp 2>/dev/null | head -n 5";
pub const LIGHT_RAW_COMMAND: &str = "dumpsys sensorservice | grep -i -A 10 light";

const LIGHT_RAW_LIMIT: usize = 1000;

/// Raw command outputs, for troubleshooting devices whose layouts are not parsed.
/// A field holds the error message when its command failed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub devices: String,
    pub cpu_info: String,
    pub mem_info: String,
    pub thermal: String,
    pub light_raw: String,
}

async fn capture(bridge: &dyn Bridge, command: &str) -> String {
    match bridge.shell(command).await {
        Ok(output) => output.trim().to_string(),
        Err(error) => error.to_string(),
    }
}

/// Fails only when the device list itself cannot be read
#[instrument(level = "debug", skip(bridge))]
pub async fn collect(bridge: &dyn Bridge) -> Result<Diagnostics, BridgeError> {
    let devices = bridge.devices().await?.trim().to_string();

    let (cpu_info, mem_info, thermal, light_raw) = tokio::join!(
        capture(bridge, cpu::CPUINFO_COMMAND),
        capture(bridge, memory::DUMPSYS_COMMAND),
        capture(bridge, THERMAL_HEAD_COMMAND),
        capture(bridge, LIGHT_RAW_COMMAND),
    );

    Ok(Diagnostics {
        devices,
        cpu_info,
        mem_info,
        thermal,
        light_raw: light_raw.chars().take(LIGHT_RAW_LIMIT).collect(),
    })
}
