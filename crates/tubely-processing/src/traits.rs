//! Narrow capability traits over external media tools.
//!
//! The ingestion service only sees these traits, so the ffprobe/ffmpeg
//! subprocess adapters can be replaced by in-process implementations or fakes.

use crate::error::MediaToolError;
use async_trait::async_trait;
use std::path::Path;

/// Dimensions of the first video stream in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Probe `path` for its first video stream.
    async fn inspect(&self, path: &Path) -> Result<VideoProperties, MediaToolError>;
}

#[async_trait]
pub trait MediaRemuxer: Send + Sync {
    /// Rewrite `input` into `output` with the index placed before the payload,
    /// copying streams without re-encoding. `input` is left untouched.
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), MediaToolError>;
}
