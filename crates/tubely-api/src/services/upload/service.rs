//! Ingestion service
//!
//! Runs one upload through authorize, validate, stage, process, publish and
//! commit, strictly in that order. The first failing stage ends the request;
//! staged files are released on every path by dropping their artifacts.
//!
//! Object-store writes and metadata commits are not transactional. When the
//! commit fails after a publish, the object key is logged as an orphan and a
//! best-effort delete is spawned; nothing retries it afterwards.

use super::thumbnails::{CachedThumbnail, ThumbnailCache};
use bytes::Bytes;
use std::fmt::Display;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tubely_core::{AppError, ErrorMetadata, MediaKind, Orientation, Video};
use tubely_db::VideoRepository;
use tubely_processing::{
    classify, fast_start, MediaInspector, MediaRemuxer, ObjectPublisher, StagedArtifact, Stager,
};
use tubely_storage::KeyDeriver;
use uuid::Uuid;

/// Size ceiling and content-type allow-list for one media kind.
#[derive(Debug, Clone)]
pub struct MediaLimits {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IngestionLimits {
    pub video: MediaLimits,
    pub thumbnail: MediaLimits,
}

impl IngestionLimits {
    pub fn limits_for(&self, kind: MediaKind) -> &MediaLimits {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Thumbnail => &self.thumbnail,
        }
    }

    /// The largest per-kind ceiling.
    pub fn max_upload_bytes(&self) -> u64 {
        self.video.max_bytes.max(self.thumbnail.max_bytes)
    }
}

/// Where committed thumbnails live.
#[derive(Clone)]
pub enum ThumbnailStrategy {
    /// Published to the object store like videos.
    ObjectStore,
    /// Held in process memory and served by the thumbnail endpoint.
    Memory {
        cache: Arc<ThumbnailCache>,
        public_base_url: String,
    },
}

/// Where a published artifact ended up, and how to finish or undo it.
enum Published {
    Stored {
        key: String,
        url: String,
    },
    /// Memory thumbnail held back until the commit succeeds.
    Pending {
        url: String,
        cache: Arc<ThumbnailCache>,
        thumbnail: CachedThumbnail,
    },
}

impl Published {
    fn url(&self) -> &str {
        match self {
            Published::Stored { url, .. } | Published::Pending { url, .. } => url,
        }
    }
}

pub struct IngestionService {
    repository: Arc<dyn VideoRepository>,
    stager: Stager,
    inspector: Arc<dyn MediaInspector>,
    remuxer: Arc<dyn MediaRemuxer>,
    keys: KeyDeriver,
    publisher: ObjectPublisher,
    limits: IngestionLimits,
    thumbnails: ThumbnailStrategy,
}

impl IngestionService {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        stager: Stager,
        inspector: Arc<dyn MediaInspector>,
        remuxer: Arc<dyn MediaRemuxer>,
        publisher: ObjectPublisher,
        limits: IngestionLimits,
        thumbnails: ThumbnailStrategy,
    ) -> Self {
        Self {
            repository,
            stager,
            inspector,
            remuxer,
            keys: KeyDeriver::default(),
            publisher,
            limits,
            thumbnails,
        }
    }

    pub fn with_key_deriver(mut self, keys: KeyDeriver) -> Self {
        self.keys = keys;
        self
    }

    pub fn limits(&self) -> &IngestionLimits {
        &self.limits
    }

    /// Fetch the target record and require that `caller_id` owns it.
    #[tracing::instrument(skip(self), fields(stage = "authorize"))]
    pub async fn authorize(&self, video_id: Uuid, caller_id: Uuid) -> Result<Video, AppError> {
        let video = self
            .repository
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

        if !video.is_owned_by(caller_id) {
            tracing::debug!(owner_id = %video.user_id, "Caller does not own video");
            return Err(AppError::Unauthorized("Must be video author".to_string()));
        }

        Ok(video)
    }

    /// Run the rest of the pipeline for an authorized record.
    ///
    /// `declared_content_type` is checked before a single byte of `reader` is
    /// consumed. Returns the committed record.
    #[tracing::instrument(
        skip(self, video, reader),
        fields(video_id = %video.id, kind = %kind)
    )]
    pub async fn ingest<R>(
        &self,
        video: Video,
        kind: MediaKind,
        declared_content_type: Option<&str>,
        reader: R,
    ) -> Result<Video, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = std::time::Instant::now();
        let limits = self.limits.limits_for(kind);

        let content_type = validate_content_type(declared_content_type, &limits.allowed_content_types)
            .map_err(stage_failed("validate"))?;

        let staged = self
            .stager
            .stage(reader, limits.max_bytes)
            .await
            .map_err(stage_failed("stage"))?;

        let published = match (kind, &self.thumbnails) {
            (MediaKind::Video, _) => self.publish_video(staged, &content_type).await?,
            (MediaKind::Thumbnail, ThumbnailStrategy::ObjectStore) => {
                self.publish_stored(&staged, None, &content_type).await?
            }
            (
                MediaKind::Thumbnail,
                ThumbnailStrategy::Memory {
                    cache,
                    public_base_url,
                },
            ) => {
                self.prepare_thumbnail(cache, public_base_url, video.id, staged, content_type)
                    .await?
            }
        };

        let committed = self.commit(video.id, kind, published).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            url = committed.media_url(kind).unwrap_or_default(),
            "Media ingested"
        );

        Ok(committed)
    }

    async fn publish_video(
        &self,
        staged: StagedArtifact,
        content_type: &str,
    ) -> Result<Published, AppError> {
        let orientation = classify(self.inspector.as_ref(), staged.path())
            .await
            .map_err(stage_failed("classify"))?;
        tracing::debug!(orientation = %orientation, "Video classified");

        let processed = fast_start(self.remuxer.as_ref(), &self.stager, &staged)
            .await
            .map_err(stage_failed("transform"))?;
        drop(staged);

        self.publish_stored(&processed, Some(orientation), content_type)
            .await
    }

    async fn publish_stored(
        &self,
        artifact: &StagedArtifact,
        bucket: Option<Orientation>,
        content_type: &str,
    ) -> Result<Published, AppError> {
        let key = self
            .keys
            .derive_key(bucket, content_type)
            .map_err(stage_failed("derive_key"))?;

        let url = self
            .publisher
            .publish(artifact, &key, content_type)
            .await
            .map_err(stage_failed("publish"))?;

        tracing::debug!(key = %key, size_bytes = artifact.len(), "Object published");
        Ok(Published::Stored { key, url })
    }

    async fn prepare_thumbnail(
        &self,
        cache: &Arc<ThumbnailCache>,
        public_base_url: &str,
        video_id: Uuid,
        staged: StagedArtifact,
        content_type: String,
    ) -> Result<Published, AppError> {
        let data = tokio::fs::read(staged.path())
            .await
            .map_err(stage_failed("publish"))?;
        drop(staged);

        Ok(Published::Pending {
            url: format!("{}/api/thumbnails/{}", public_base_url, video_id),
            cache: cache.clone(),
            thumbnail: CachedThumbnail {
                content_type,
                data: Bytes::from(data),
            },
        })
    }

    /// Write the published URL into the record's column for `kind`.
    ///
    /// Only that column changes. The returned record is the stored one, including
    /// writes committed by other uploads since `authorize`.
    async fn commit(
        &self,
        video_id: Uuid,
        kind: MediaKind,
        published: Published,
    ) -> Result<Video, AppError> {
        let result = self
            .repository
            .set_media_url(video_id, kind, published.url())
            .await;

        match result {
            Ok(committed) => {
                if let Published::Pending {
                    cache, thumbnail, ..
                } = published
                {
                    cache.insert(video_id, thumbnail).await;
                }
                Ok(committed)
            }
            Err(err) => {
                self.release_uncommitted(video_id, published);
                Err(stage_failed("commit")(err))
            }
        }
    }

    fn release_uncommitted(&self, video_id: Uuid, published: Published) {
        match published {
            Published::Stored { key, url } => {
                tracing::error!(
                    video_id = %video_id,
                    stage = "commit",
                    key = %key,
                    url = %url,
                    "Metadata commit failed after publish; object is orphaned"
                );

                let storage = self.publisher.storage().clone();
                tokio::spawn(async move {
                    match storage.delete(&key).await {
                        Ok(()) => tracing::info!(key = %key, "Orphaned object deleted"),
                        Err(e) => {
                            tracing::warn!(key = %key, error = %e, "Failed to delete orphaned object")
                        }
                    }
                });
            }
            Published::Pending { .. } => {
                tracing::debug!(video_id = %video_id, "Discarding uncommitted thumbnail");
            }
        }
    }
}

/// Strip parameters, lowercase, and require membership in `allowed`.
pub fn validate_content_type(
    declared: Option<&str>,
    allowed: &[String],
) -> Result<String, AppError> {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty())
        .ok_or_else(|| AppError::UnsupportedContentType("Missing Content-Type".to_string()))?;

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&declared)) {
        Ok(declared)
    } else {
        Err(AppError::UnsupportedContentType(format!(
            "Invalid file type: {}",
            declared
        )))
    }
}

/// Log a failed stage with its name, then hand back the `AppError`.
fn stage_failed<E>(stage: &'static str) -> impl FnOnce(E) -> AppError
where
    E: Into<AppError> + Display,
{
    move |err| {
        let message = err.to_string();
        let err: AppError = err.into();
        if err.http_status_code() >= 500 {
            tracing::error!(stage, error = %message, "Ingestion stage failed");
        } else {
            tracing::debug!(stage, error = %message, "Ingestion rejected");
        }
        err
    }
}
