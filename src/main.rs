use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use std::io;
use tracing::{info, warn};

mod api;
mod area;
mod auth;
mod cli;
mod config;
mod db;
mod events;
mod shutdown;
mod telemetry;
mod uploads;

use crate::api::{
    booking::handlers::booking_config,
    customer::handlers::customer_config,
    events::events_config,
    health::health_config,
    job::{handlers::job_config, JobService},
    provider::{handlers::provider_config, ProviderService},
    validation,
};
use crate::auth::TokenKeys;
use crate::cli::{Cli, Command};
use crate::events::EventBus;
use crate::shutdown::ShutdownCoordinator;
use crate::uploads::UploadStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = config::Config::from_env().map_err(io::Error::other)?;
    telemetry::init(&config.log_dir)?;

    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .map_err(io::Error::other)?;
    info!("Database connection pool established");

    db::migrations::run_migrations(&pool)
        .await
        .map_err(io::Error::other)?;
    info!("Database migrations completed successfully");

    let backfilled = db::job_repository::JobRepository::backfill_area_keys(&pool)
        .await
        .map_err(io::Error::other)?;
    if backfilled > 0 {
        info!("Derived area keys for {} stored jobs", backfilled);
    }

    if *cli.command() == Command::Migrate {
        pool.close().await;
        return Ok(());
    }

    info!("Starting service-hub");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Uploads directory: {}", config.uploads_dir);
    info!("  - Event buffer per subscriber: {}", config.event_capacity);
    match &config.cors_origin {
        Some(origin) => info!("  - CORS origin: {}", origin),
        None => info!("  - CORS origin: any"),
    }
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; provider tokens are signed with the development secret");
    }

    std::fs::create_dir_all(&config.uploads_dir)?;

    let events = EventBus::new(config.event_capacity);
    let upload_store = UploadStore::new(&config.uploads_dir);
    let job_service = web::Data::new(JobService::new(
        pool.clone(),
        events.clone(),
        upload_store.clone(),
    ));
    let provider_service = web::Data::new(ProviderService::new(
        pool.clone(),
        events.clone(),
        TokenKeys::from_secret(&config.jwt_secret),
        upload_store.clone(),
    ));

    let server_pool = pool.clone();
    let server_events = events.clone();
    let max_payload_size = config.max_payload_size;
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);
        let multipart_config = MultipartFormConfig::default().total_limit(max_payload_size);

        App::new()
            .wrap(server_config.cors())
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(web::Data::new(server_events.clone()))
            .app_data(job_service.clone())
            .app_data(provider_service.clone())
            .app_data(payload_config)
            .app_data(multipart_config)
            .app_data(validation::json_config())
            .configure(health_config)
            .configure(job_config)
            .configure(booking_config)
            .configure(provider_config)
            .configure(customer_config)
            .configure(events_config)
            .service(upload_store.files_service())
    });

    info!("Server starting on http://{}:{}", config.host, config.port);

    let server = server.bind((config.host.as_str(), config.port))?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, events, pool)
        .wait_for_shutdown()
        .await
}
