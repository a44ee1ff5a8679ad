//! Process-local thumbnail store used when `THUMBNAIL_STORAGE=memory`.
//!
//! Entries are lost on restart and are not shared between processes. An entry
//! is only written once its URL has been committed to the video record.

use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedThumbnail {
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: RwLock<HashMap<Uuid, CachedThumbnail>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a thumbnail and return the one it replaced.
    pub async fn insert(&self, video_id: Uuid, thumbnail: CachedThumbnail) -> Option<CachedThumbnail> {
        self.entries.write().await.insert(video_id, thumbnail)
    }

    pub async fn get(&self, video_id: Uuid) -> Option<CachedThumbnail> {
        self.entries.read().await.get(&video_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
