use regex::Captures;
use tracing::*;

use super::patterns::{first_number, number, OrderedPatterns};
use crate::bridge::Bridge;

pub const TOP_COMMAND: &str = "top -n 1 -m 1";
pub const CPUINFO_COMMAND: &str = "dumpsys cpuinfo | grep Load";

lazy_static! {
    static ref USAGE: OrderedPatterns<f64> = OrderedPatterns::new(&[
        // Legacy toolbox top: "User 5%, System 2%, IOW 0%, IRQ 0%".
        // A word preceded by '%' belongs to the toybox layout ("10%user 0%nice")
        (r"(?i)(?:^|[^%\w])User (\d+)%(?:.*?System (\d+)%)?", user_plus_system),
        (r"(?i)(?:^|[^%\w])System (\d+)%", first_number),
        // Toybox top: "800%cpu 10%user 0%nice 32%sys 758%idle"
        (r"(?i)(\d+)%user(?:.*?(\d+)%sys)?", user_plus_system),
    ])
    .expect("Invalid CPU usage patterns");
    static ref LOAD: OrderedPatterns<f64> =
        OrderedPatterns::new(&[(r"Load:\s*([\d.]+)", first_number)])
            .expect("Invalid CPU load pattern");
}

fn user_plus_system(captures: &Captures) -> Option<f64> {
    let user = number(captures, 1)?;
    let system = number(captures, 2).unwrap_or_default();
    Some(user + system)
}

/// User plus system percentage from `top` output
pub fn parse_top(output: &str) -> Option<f64> {
    USAGE.first_match(output)
}

/// First load average figure from `dumpsys cpuinfo`
pub fn parse_load(output: &str) -> Option<f64> {
    LOAD.first_match(output)
}

#[instrument(level = "debug", skip(bridge))]
pub async fn read_cpu_usage(bridge: &dyn Bridge) -> Option<f64> {
    match bridge.shell(TOP_COMMAND).await {
        Ok(output) => {
            if let Some(usage) = parse_top(&output) {
                return Some(usage);
            }
            trace!("Unknown top layout, falling back to cpuinfo load");
        }
        Err(error) => debug!("Failed reading top: {error}"),
    }

    match bridge.shell(CPUINFO_COMMAND).await {
        Ok(output) => parse_load(&output),
        Err(error) => {
            debug!("Failed reading cpuinfo: {error}");
            None
        }
    }
}
