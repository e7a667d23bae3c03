use actix_web::{rt, web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::*;

use super::{
    error::{Error, Result},
    manager::AppState,
};
use crate::{
    bridge::probe,
    sensors::{
        diagnostics::{self, Diagnostics},
        history::HistorySummary,
        DeviceReading,
    },
};

const NOT_CONNECTED: &str = "Please connect your phone via USB and enable USB debugging";

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ready,
    WaitingForDevice,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub connected: bool,
    pub service: &'static str,
    pub status: HealthStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub name: &'static str,
    pub version: &'static str,
    pub build_date: &'static str,
    pub authors: &'static str,
    pub bridge: String,
}

pub fn new_info(state: &AppState) -> Info {
    Info {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build_date: option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("?"),
        authors: env!("CARGO_PKG_AUTHORS"),
        bridge: state.reader.bridge().program().to_string(),
    }
}

/// Current device reading, or 503 when no authorized device is attached
pub async fn sensors(state: web::Data<AppState>) -> Result<web::Json<DeviceReading>> {
    if !probe::is_connected(state.reader.bridge()).await {
        return Err(Error::Unavailable(NOT_CONNECTED.to_string()));
    }

    let reading = state.reader.read().await;

    state
        .history
        .lock()
        .map_err(|error| Error::Internal(format!("{error:?}")))?
        .push(&reading);

    Ok(web::Json(reading))
}

pub async fn health(state: web::Data<AppState>) -> web::Json<Health> {
    let connected = probe::is_connected(state.reader.bridge()).await;

    web::Json(Health {
        connected,
        service: env!("CARGO_PKG_NAME"),
        status: if connected {
            HealthStatus::Ready
        } else {
            HealthStatus::WaitingForDevice
        },
    })
}

/// Raw command outputs for layouts the parsers do not understand yet
pub async fn debug(state: web::Data<AppState>) -> Result<web::Json<Diagnostics>> {
    let diagnostics = diagnostics::collect(state.reader.bridge()).await?;

    Ok(web::Json(diagnostics))
}

pub async fn history(state: web::Data<AppState>) -> Result<web::Json<HistorySummary>> {
    let summary = state
        .history
        .lock()
        .map_err(|error| Error::Internal(format!("{error:?}")))?
        .summary();

    Ok(web::Json(summary))
}

pub async fn info(state: web::Data<AppState>) -> web::Json<Info> {
    web::Json(new_info(&state))
}

pub async fn not_found(req: HttpRequest) -> Result<HttpResponse> {
    Err(Error::NotFound(req.path().to_string()))
}

pub async fn log(req: HttpRequest, stream: web::Payload) -> Result<HttpResponse> {
    let (response, mut session, _stream) =
        actix_ws::handle(&req, stream).map_err(|error| Error::Internal(format!("{error:?}")))?;

    rt::spawn(async move {
        let subscription = crate::logger::manager::HISTORY
            .lock()
            .ok()
            .map(|history| history.subscribe());
        let Some((mut receiver, history)) = subscription else {
            warn!("Log history is unavailable");
            let _ = session.close(None).await;
            return;
        };

        for message in history {
            if session.text(message).await.is_err() {
                return;
            }
        }

        while let Ok(message) = receiver.recv().await {
            if session.text(message).await.is_err() {
                return;
            }
        }
    });

    Ok(response)
}
