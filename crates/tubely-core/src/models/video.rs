use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::media::MediaKind;

/// A video record as owned by the metadata store.
///
/// Ingestion only ever writes `thumbnail_url` or `video_url`; `id` and
/// `user_id` are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub user_id: Uuid,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Current URL for the given media kind.
    pub fn media_url(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Video => self.video_url.as_deref(),
            MediaKind::Thumbnail => self.thumbnail_url.as_deref(),
        }
    }

    /// Copy of this record with the URL for `kind` replaced and `updated_at` bumped.
    pub fn with_media_url(&self, kind: MediaKind, url: String) -> Video {
        let mut updated = self.clone();
        match kind {
            MediaKind::Video => updated.video_url = Some(url),
            MediaKind::Thumbnail => updated.thumbnail_url = Some(url),
        }
        updated.updated_at = Utc::now();
        updated
    }
}
