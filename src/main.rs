use actix_web::{web, App, HttpServer};
use log::info;
use std::io;

use blobvault::app_state::AppState;
use blobvault::config::AppConfig;
use blobvault::http;
use blobvault::logging;

fn startup_error(e: Box<dyn std::error::Error>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let logger = logging::init_console().map_err(startup_error)?;
    let config = AppConfig::load().map_err(startup_error)?;
    logging::apply_config(&logger, &config.logging);

    let host = config.server.host.clone();
    let port = config.server.port;
    let workers = config.server.workers;
    let max_payload_size = config.server.max_payload_size;
    info!("Starting server on {}:{} with {} workers", host, port, workers);

    let app_state = web::Data::new(AppState::from_config(config));

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(app_state.clone())
            .configure(http::configure)
    })
    .workers(workers)
    .bind((host.as_str(), port))?
    .run()
    .await
}
