use tracing::*;

use super::adb::Bridge;

const MINIMUM_SERIAL_LENGTH: usize = 4;

/// Serials of the authorized devices listed by `adb devices`
pub fn parse_device_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains("List of devices") && !line.contains("daemon"))
        .filter(|line| line.contains('\t'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = fields.next()?;
            (state == "device" && serial.len() >= MINIMUM_SERIAL_LENGTH)
                .then(|| serial.to_string())
        })
        .collect()
}

/// True when at least one authorized device is attached.
///
/// A missing tool, a timeout or a failing command all read as "not connected".
#[instrument(level = "debug", skip(bridge))]
pub async fn is_connected(bridge: &dyn Bridge) -> bool {
    let output = match bridge.devices().await {
        Ok(output) => output,
        Err(error) => {
            warn!("Failed listing devices: {error}");
            return false;
        }
    };

    let devices = parse_device_list(&output);
    if devices.is_empty() {
        debug!("No devices found");
        return false;
    }

    trace!("Devices detected: {devices:?}");
    true
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::bridge::testing::ScriptedBridge;

    #[test]
    fn header_and_daemon_lines_are_not_devices() {
        let output = "* daemon not running; starting now at tcp:5037\n\
                      * daemon started successfully\n\
                      List of devices attached\n\n";
        assert!(parse_device_list(output).is_empty());
    }

    #[test]
    fn authorized_device_is_listed() {
        let output = "List of devices attached\nABCD1234\tdevice\n\n";
        assert_eq!(parse_device_list(output), vec!["ABCD1234".to_string()]);
    }

    #[test]
    fn unauthorized_offline_and_short_serials_are_skipped() {
        let output = "List of devices attached\n\
                      R58M123ABC\tunauthorized\n\
                      emulator-5554\toffline\n\
                      abc\tdevice\n\
                      0123456789ABCDEF\tdevice\n";
        assert_eq!(
            parse_device_list(output),
            vec!["0123456789ABCDEF".to_string()]
        );
    }

    #[tokio::test]
    async fn connection_follows_device_list() {
        let bridge =
            ScriptedBridge::default().with_devices("List of devices attached\nABCD1234\tdevice\n");
        assert!(is_connected(&bridge).await);

        let bridge = ScriptedBridge::default()
            .with_devices("List of devices attached\n* daemon started successfully\n");
        assert!(!is_connected(&bridge).await);
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_tool_reads_as_disconnected() {
        let bridge = ScriptedBridge::default();
        assert!(!is_connected(&bridge).await);
        assert!(logs_contain("Failed listing devices"));
    }
}
