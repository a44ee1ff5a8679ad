//! Application state shared by every handler.

use crate::auth::JwtService;
use crate::services::upload::{IngestionService, ThumbnailCache};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub jwt: JwtService,
    /// Backing store for the in-memory thumbnail endpoint. Stays empty when
    /// thumbnails go to the object store.
    pub thumbnails: Arc<ThumbnailCache>,
}
