//! Ingestion service wiring

use crate::auth::JwtService;
use crate::services::upload::{
    IngestionLimits, IngestionService, MediaLimits, ThumbnailCache, ThumbnailStrategy,
};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::{Config, ThumbnailStorageMode};
use tubely_db::{PgVideoRepository, VideoRepository};
use tubely_processing::{FfmpegRemuxer, FfprobeInspector, ObjectPublisher, Stager};
use tubely_storage::Storage;

pub fn ingestion_limits(config: &Config) -> IngestionLimits {
    IngestionLimits {
        video: MediaLimits {
            max_bytes: config.max_video_size_bytes(),
            allowed_content_types: config.video_allowed_content_types().to_vec(),
        },
        thumbnail: MediaLimits {
            max_bytes: config.max_thumbnail_size_bytes(),
            allowed_content_types: config.thumbnail_allowed_content_types().to_vec(),
        },
    }
}

/// Build the application state from configuration and already-connected backends.
pub async fn initialize_services(
    config: &Config,
    pool: sqlx::PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    tokio::fs::create_dir_all(config.staging_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.staging_dir().display()
            )
        })?;

    let inspector = FfprobeInspector::new(config.ffprobe_path())
        .context("Invalid FFPROBE_PATH")?;
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path()).context("Invalid FFMPEG_PATH")?;

    let repository: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));
    let thumbnails = Arc::new(ThumbnailCache::new());

    let strategy = match config.thumbnail_storage() {
        ThumbnailStorageMode::ObjectStore => ThumbnailStrategy::ObjectStore,
        ThumbnailStorageMode::Memory => {
            tracing::warn!(
                "THUMBNAIL_STORAGE=memory: thumbnails are lost on restart and not shared between instances"
            );
            ThumbnailStrategy::Memory {
                cache: thumbnails.clone(),
                public_base_url: config.public_base_url().to_string(),
            }
        }
    };

    let ingestion = IngestionService::new(
        repository,
        Stager::new(config.staging_dir().clone()),
        Arc::new(inspector),
        Arc::new(remuxer),
        ObjectPublisher::new(storage),
        ingestion_limits(config),
        strategy,
    );

    tracing::info!(
        staging_dir = %config.staging_dir().display(),
        thumbnail_storage = ?config.thumbnail_storage(),
        "Ingestion service initialized"
    );

    Ok(Arc::new(AppState {
        ingestion: Arc::new(ingestion),
        jwt: JwtService::new(config.jwt_secret()),
        thumbnails,
    }))
}
