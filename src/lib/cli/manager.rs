use std::{sync::Arc, time::Duration};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION")
)]
pub struct Args {
    /// Sets the address for the REST API server
    #[arg(
        long = "rest-server",
        value_name = "IP:PORT",
        env = "SENSOR_BRIDGE_REST_SERVER",
        default_value = "0.0.0.0:3001"
    )]
    pub rest_server: String,

    /// Path to the adb executable, skips the automatic search when set
    #[arg(long = "adb-path", value_name = "PATH", env = "ADB_PATH")]
    pub adb_path: Option<String>,

    /// Timeout applied to every adb invocation, in milliseconds
    #[arg(long = "command-timeout", value_name = "MS", default_value_t = 5000)]
    pub command_timeout: u64,

    /// Specifies the path in which the logs will be stored
    #[arg(long = "log-path", value_name = "PATH", default_value = "./logs")]
    pub log_path: String,

    /// Turns all log categories up to Debug, for more information check RUST_LOG env variable
    #[arg(short, long)]
    pub verbose: bool,

    /// Turns all log categories up to Trace to the log file, for more information check RUST_LOG env variable
    #[arg(long = "enable-tracing-level-log-file")]
    pub enable_tracing_level_log_file: bool,
}

#[derive(Debug)]
struct Manager {
    args: Args,
}

lazy_static! {
    static ref MANAGER: Arc<Manager> = Arc::new(Manager::new());
}

impl Manager {
    fn new() -> Self {
        Self {
            args: Args::parse(),
        }
    }
}

// Construct our manager, should be done inside main
pub fn init() {
    MANAGER.as_ref();
}

// Check if the verbosity parameter was used
pub fn is_verbose() -> bool {
    MANAGER.args.verbose
}

pub fn is_tracing() -> bool {
    MANAGER.args.enable_tracing_level_log_file
}

// Return the desired address for the REST API
pub fn server_address() -> &'static str {
    &MANAGER.args.rest_server
}

pub fn adb_path() -> Option<&'static str> {
    MANAGER.args.adb_path.as_deref()
}

pub fn command_timeout() -> Duration {
    Duration::from_millis(MANAGER.args.command_timeout)
}

pub fn log_path() -> &'static str {
    &MANAGER.args.log_path
}

// Return the command line used to start this application
pub fn command_line_string() -> String {
    std::env::args().collect::<Vec<String>>().join(" ")
}

pub fn command_line() -> String {
    format!("{:#?}", MANAGER.args)
}
