pub mod service;
pub mod thumbnails;

pub use service::{
    validate_content_type, IngestionLimits, IngestionService, MediaLimits, ThumbnailStrategy,
};
pub use thumbnails::{CachedThumbnail, ThumbnailCache};
