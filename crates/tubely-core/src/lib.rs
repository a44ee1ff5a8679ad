//! Tubely Core Library
//!
//! Domain models, error types and configuration shared by every Tubely crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::{Config, ThumbnailStorageMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaKind, Orientation, Video};
pub use storage_types::StorageBackend;
