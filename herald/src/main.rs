use std::sync::Arc;

use anyhow::Context;
use herald::api::{ApiServer, AppState};
use herald::channels::install_rustls_provider;
use herald::config::AppConfig;
use herald::services::ServiceContainer;
use herald::{database, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    install_rustls_provider();

    let config = AppConfig::from_env_or_default();
    let (logging_config, _log_guard) =
        logging::init_logging(&config.log_dir).context("failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting herald");

    let pool = database::init_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    database::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let container = Arc::new(ServiceContainer::new(pool, &config)?);
    logging_config.start_retention_cleanup(container.cancellation_token());
    container.start();

    let server = ApiServer::new(
        config.api.clone(),
        AppState::from_container(&container),
        container.cancellation_token(),
    );

    let shutdown_container = container.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received");
        shutdown_container.cancellation_token().cancel();
    });

    if let Err(e) = server.run().await {
        error!("API server error: {}", e);
    }

    container.shutdown().await?;
    info!("herald stopped");
    Ok(())
}
