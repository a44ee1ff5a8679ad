//! Storage setup and initialization

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tubely_core::{Config, StorageBackend};
use tubely_storage::{create_storage, Storage};

/// Create the configured object store.
///
/// Also returns the directory to serve under `/assets` when objects live on
/// the local filesystem, so the URLs the local backend hands out resolve.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Option<PathBuf>)> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    let backend = storage.backend_type();

    let assets_dir = match backend {
        StorageBackend::Local => config.local_storage_path().map(PathBuf::from),
        StorageBackend::S3 => None,
    };

    tracing::info!(
        backend = %backend,
        bucket = config.s3_bucket().unwrap_or("-"),
        assets_dir = ?assets_dir,
        "Storage initialized"
    );

    Ok((storage, assets_dir))
}
