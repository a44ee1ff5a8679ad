pub mod health;
pub mod thumbnail_get;
pub mod thumbnail_upload;
pub(crate) mod upload;
pub mod video_upload;
