//! Database repositories for the metadata store.
//!
//! Ingestion only needs to read a video record and set one of its media URLs,
//! so the surface is a single repository trait with a Postgres implementation.

pub mod video;

pub use video::{PgVideoRepository, VideoRepository};
