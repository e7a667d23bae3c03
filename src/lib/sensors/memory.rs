use regex::Captures;
use tracing::*;

use super::patterns::{first_number, number, OrderedPatterns};
use crate::bridge::Bridge;

pub const MEMINFO_COMMAND: &str = "cat /proc/meminfo";
pub const DUMPSYS_COMMAND: &str = "dumpsys meminfo | grep \"Used RAM\"";

const KB_PER_MB: f64 = 1024.0;

lazy_static! {
    // /proc/meminfo always lists MemTotal first, then MemFree and MemAvailable
    static ref MEMINFO: OrderedPatterns<f64> = OrderedPatterns::new(&[
        (r"(?s)MemTotal:\s*(\d+)\s*kB.*?MemAvailable:\s*(\d+)\s*kB", total_minus_other),
        (r"(?s)MemTotal:\s*(\d+)\s*kB.*?MemFree:\s*(\d+)\s*kB", total_minus_other),
    ])
    .expect("Invalid meminfo patterns");
    static ref USED_RAM: OrderedPatterns<f64> =
        OrderedPatterns::new(&[(r"Used RAM:\s*([\d,]+)", first_number)])
            .expect("Invalid used RAM pattern");
}

fn total_minus_other(captures: &Captures) -> Option<f64> {
    Some(number(captures, 1)? - number(captures, 2)?)
}

/// Used memory in MB from `/proc/meminfo`
pub fn parse_meminfo(output: &str) -> Option<f64> {
    MEMINFO.first_match(output).map(|used_kb| used_kb / KB_PER_MB)
}

/// Used memory in MB from the `Used RAM: 1,234,567K` line of `dumpsys meminfo`
pub fn parse_used_ram(output: &str) -> Option<f64> {
    USED_RAM.first_match(output).map(|used_kb| used_kb / KB_PER_MB)
}

#[instrument(level = "debug", skip(bridge))]
pub async fn read_ram_usage(bridge: &dyn Bridge) -> Option<f64> {
    match bridge.shell(MEMINFO_COMMAND).await {
        Ok(output) => {
            if let Some(used) = parse_meminfo(&output) {
                return Some(used);
            }
            trace!("Unknown meminfo layout, falling back to dumpsys meminfo");
        }
        Err(error) => debug!("Failed reading meminfo: {error}"),
    }

    match bridge.shell(DUMPSYS_COMMAND).await {
        Ok(output) => parse_used_ram(&output),
        Err(error) => {
            debug!("Failed reading dumpsys meminfo: {error}");
            None
        }
    }
}
