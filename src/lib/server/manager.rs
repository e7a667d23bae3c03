use std::sync::Mutex;

use actix_cors::Cors;
use actix_extensible_rate_limit::{
    backend::{memory::InMemoryBackend, SimpleInputFunctionBuilder},
    RateLimiter,
};
use actix_web::{web, App, HttpServer};
use tracing::*;
use tracing_actix_web::TracingLogger;

use super::pages;
use crate::sensors::{history::ReadingHistory, SensorReader};

/// Shared by every worker through `web::Data`
pub struct AppState {
    pub reader: SensorReader,
    pub history: Mutex<ReadingHistory>,
}

impl AppState {
    pub fn new(reader: SensorReader) -> Self {
        Self {
            reader,
            history: Mutex::new(ReadingHistory::default()),
        }
    }
}

// Start REST API server with the desired address
pub async fn run(server_address: &str, state: web::Data<AppState>) -> std::io::Result<()> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .send_wildcard()
                    .max_age(3600),
            )
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(server_address)?;

    info!("Test connection: http://{server_address}/api/health");

    server.run().await
}

/// Register the `/api` routes, shared by the server and the integration tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/sensors", web::get().to(pages::sensors))
            .route("/health", web::get().to(pages::health))
            .route("/history", web::get().to(pages::history))
            .route("/info", web::get().to(pages::info))
            .route("/log", web::get().to(pages::log))
            .service(
                web::scope("/debug")
                    // Every call spawns several adb processes, avoid flooding the device
                    .wrap(
                        RateLimiter::builder(
                            InMemoryBackend::builder().build(),
                            SimpleInputFunctionBuilder::new(std::time::Duration::from_secs(1), 4)
                                .real_ip_key()
                                .build(),
                        )
                        .add_headers()
                        .build(),
                    )
                    .route("", web::get().to(pages::debug)),
            ),
    )
    .default_service(web::to(pages::not_found));
}
