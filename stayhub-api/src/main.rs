use std::process::ExitCode;
use std::sync::Arc;

use stayhub_api::{app, telemetry, AppState, StartupError};
use stayhub_core::{
    BookingService, BookingStore, ContactIntake, ContactRepository, UploadRelay,
};
use stayhub_store::app_config::{Config, StorageBackend};
use stayhub_store::{CloudinaryClient, DbClient, MemoryStore, PgBookingStore, PgContactRepository};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", StartupError::from(err));
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(&config.telemetry.log_level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("stayhub-api stopped: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let addr = config.server.socket_addr()?;

    let (booking_store, contact_repository) = open_storage(&config).await?;

    if !config.image_host.has_credentials() {
        warn!("image host credentials are not configured; uploads will be rejected upstream");
    }
    let image_host = CloudinaryClient::new(&config.image_host)?;

    let state = AppState::new(
        BookingService::new(booking_store, config.business_rules.transition_policy),
        ContactIntake::new(contact_repository),
        UploadRelay::new(Arc::new(image_host)),
        config.upload.max_bytes,
    );
    info!(
        policy = ?config.business_rules.transition_policy,
        backend = ?config.storage.backend,
        "Starting StayHub API on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("StayHub API shut down");
    Ok(())
}

async fn open_storage(
    config: &Config,
) -> Result<(Arc<dyn BookingStore>, Arc<dyn ContactRepository>), StartupError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage seeded with demo data; nothing is persisted");
            let store = MemoryStore::new();
            store.seed_demo().await;
            let bookings: Arc<dyn BookingStore> = Arc::new(store.clone());
            let contacts: Arc<dyn ContactRepository> = Arc::new(store);
            Ok((bookings, contacts))
        }
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database).await?;
            if config.database.run_migrations {
                db.migrate().await?;
            }
            let bookings: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(db.pool.clone()));
            let contacts: Arc<dyn ContactRepository> = Arc::new(PgContactRepository::new(db.pool));
            Ok((bookings, contacts))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
