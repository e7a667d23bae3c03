use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::*;

use super::{
    error::{BridgeError, Result},
    locator,
};

/// Everything the sensor pipeline needs from the device bridge.
///
/// Implementations must bound every call in time: a stalled device is reported
/// as an error, never awaited forever.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Raw output of the device enumeration subcommand
    async fn devices(&self) -> Result<String>;

    /// Stdout of `command`, executed by the device's remote shell.
    /// Pipes and redirections inside `command` are handled remotely.
    async fn shell(&self, command: &str) -> Result<String>;

    /// How the bridge tool is being invoked
    fn program(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: String,
    timeout: Duration,
}

impl AdbBridge {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Uses the first adb found by [`locator::locate`]
    pub fn located(timeout: Duration) -> Self {
        Self::new(locator::locate(), timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(level = "trace", skip(self))]
    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(output) => output.map_err(|source| BridgeError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_elapsed) => {
                return Err(BridgeError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(BridgeError::Failed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    async fn devices(&self) -> Result<String> {
        self.run(&["devices"]).await
    }

    async fn shell(&self, command: &str) -> Result<String> {
        self.run(&["shell", command]).await
    }

    fn program(&self) -> &str {
        &self.program
    }
}
