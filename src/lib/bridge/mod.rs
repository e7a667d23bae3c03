pub mod adb;
pub mod error;
pub mod locator;
pub mod probe;

pub use adb::{AdbBridge, Bridge};

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::{
        adb::Bridge,
        error::{BridgeError, Result},
    };

    /// Bridge answering from canned outputs, keyed by the exact shell command.
    /// Anything not scripted fails like a command exiting with status 1.
    #[derive(Debug, Default)]
    pub struct ScriptedBridge {
        devices: Option<String>,
        outputs: HashMap<String, String>,
    }

    impl ScriptedBridge {
        pub fn with_devices(mut self, output: &str) -> Self {
            self.devices = Some(output.to_string());
            self
        }

        pub fn with_output(mut self, command: &str, output: &str) -> Self {
            self.outputs.insert(command.to_string(), output.to_string());
            self
        }
    }

    fn failure(command: &str) -> BridgeError {
        BridgeError::Failed {
            command: command.to_string(),
            code: Some(1),
            stderr: String::new(),
        }
    }

    #[async_trait]
    impl Bridge for ScriptedBridge {
        async fn devices(&self) -> Result<String> {
            self.devices.clone().ok_or_else(|| failure("devices"))
        }

        async fn shell(&self, command: &str) -> Result<String> {
            self.outputs
                .get(command)
                .cloned()
                .ok_or_else(|| failure(command))
        }

        fn program(&self) -> &str {
            "scripted"
        }
    }
}
