//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use std::sync::Arc;
use tubely_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: &Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_json())?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(config).await?;
    let (storage, assets_dir) = storage::setup_storage(config).await?;
    let state = services::initialize_services(config, pool, storage).await?;

    let router = routes::build_router(
        state.clone(),
        routes::RouterOptions {
            max_upload_bytes: state.ingestion.limits().max_upload_bytes(),
            assets_dir,
        },
    );

    Ok((state, router))
}
