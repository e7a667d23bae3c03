use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::*;

/// Name used when adb is expected to be reachable through PATH
pub const DEFAULT_PROGRAM: &str = "adb";

#[cfg(windows)]
const EXECUTABLE: &str = "adb.exe";
#[cfg(not(windows))]
const EXECUTABLE: &str = "adb";

#[cfg(windows)]
const CONVENTIONAL_PATHS: &[&str] = &[
    r"C:\adb\adb.exe",
    r"C:\Program Files\Android\android-sdk\platform-tools\adb.exe",
    r"C:\Program Files (x86)\Android\android-sdk\platform-tools\adb.exe",
];
#[cfg(target_os = "macos")]
const CONVENTIONAL_PATHS: &[&str] = &["/opt/homebrew/bin/adb", "/usr/local/bin/adb"];
#[cfg(all(not(windows), not(target_os = "macos")))]
const CONVENTIONAL_PATHS: &[&str] = &[
    "/usr/bin/adb",
    "/usr/local/bin/adb",
    "/opt/android-sdk/platform-tools/adb",
];

/// Find how adb should be invoked on this machine.
///
/// Order: `adb` from PATH (it must answer `adb version`), the OS conventional
/// install locations, then SDK roots taken from the environment.
/// Never fails: when nothing is found the bare command name is returned and
/// later invocations are expected to fail like a disconnected device.
#[instrument(level = "debug")]
pub fn locate() -> String {
    locate_with(
        responds_to_version,
        |path| path.exists(),
        |key| std::env::var(key).ok(),
    )
}

pub fn locate_with(
    responds: impl Fn(&str) -> bool,
    exists: impl Fn(&Path) -> bool,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    if responds(DEFAULT_PROGRAM) {
        debug!("Using {DEFAULT_PROGRAM:?} from PATH");
        return DEFAULT_PROGRAM.to_string();
    }

    let candidates = CONVENTIONAL_PATHS
        .iter()
        .map(PathBuf::from)
        .chain(environment_paths(&env));

    for candidate in candidates {
        if exists(&candidate) {
            debug!("Using adb found at {candidate:?}");
            return candidate.to_string_lossy().into_owned();
        }
    }

    warn!("adb was not found, falling back to {DEFAULT_PROGRAM:?}");
    DEFAULT_PROGRAM.to_string()
}

fn environment_paths(env: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut sdk_roots: Vec<PathBuf> = ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
        .into_iter()
        .filter_map(|key| env(key))
        .map(PathBuf::from)
        .collect();

    if cfg!(windows) {
        if let Some(local_app_data) = env("LOCALAPPDATA") {
            sdk_roots.push(Path::new(&local_app_data).join("Android").join("Sdk"));
        }
    } else if let Some(home) = env("HOME") {
        let home = Path::new(&home);
        sdk_roots.push(home.join("Android").join("Sdk"));
        sdk_roots.push(home.join("Library").join("Android").join("sdk"));
    }

    sdk_roots
        .into_iter()
        .map(|root| root.join("platform-tools").join(EXECUTABLE))
        .collect()
}

fn responds_to_version(program: &str) -> bool {
    Command::new(program)
        .arg("version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
