use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use tubely_core::{AppError, MediaKind, Video};
use uuid::Uuid;

/// Read/write access to video records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Set the URL column for `kind` and bump `updated_at`, leaving every
    /// other column as stored. Returns the record after the write; unknown ids
    /// are a `NotFound` error.
    async fn set_media_url(&self, id: Uuid, kind: MediaKind, url: &str) -> Result<Video, AppError>;
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(
            r#"
            SELECT id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self, url), fields(db.table = "videos", db.operation = "update", video_id = %id, kind = %kind))]
    async fn set_media_url(
        &self,
        id: Uuid,
        kind: MediaKind,
        url: &str,
    ) -> Result<Video, AppError> {
        let column = match kind {
            MediaKind::Video => "video_url",
            MediaKind::Thumbnail => "thumbnail_url",
        };

        // The other media column is never written here.
        let sql = format!(
            r#"
            UPDATE videos
            SET {column} = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id
            "#
        );

        let video = sqlx::query_as::<Postgres, Video>(&sql)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        video.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }
}
