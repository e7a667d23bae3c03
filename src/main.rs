use std::sync::Arc;

use actix_web::web;
use anyhow::{anyhow, Context, Result};
use tracing::*;

use scada_sensor_bridge::{
    bridge::{AdbBridge, Bridge},
    cli, logger,
    sensors::SensorReader,
    server::{self, manager::AppState},
};

#[actix_web::main]
async fn main() -> Result<()> {
    cli::manager::init();
    logger::manager::init().map_err(|error| anyhow!("Failed to start logger: {error}"))?;

    let timeout = cli::manager::command_timeout();
    let bridge = match cli::manager::adb_path() {
        Some(program) => AdbBridge::new(program, timeout),
        None => AdbBridge::located(timeout),
    };
    info!(
        "Using adb at {:?} with a {:?} command timeout",
        bridge.program(),
        bridge.timeout()
    );
    info!("Waiting for Android device connection...");

    let state = web::Data::new(AppState::new(SensorReader::new(Arc::new(bridge))));

    server::manager::run(cli::manager::server_address(), state)
        .await
        .with_context(|| format!("Failed starting web API at {}", cli::manager::server_address()))
}
