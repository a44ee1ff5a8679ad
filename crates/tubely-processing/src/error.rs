use std::io;
use thiserror::Error;
use tubely_core::AppError;

/// Failures from the probe and remux stages.
#[derive(Debug, Error)]
pub enum MediaToolError {
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("No video streams found")]
    NoStreams,

    #[error("Transform failed: {0}")]
    TransformFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<MediaToolError> for AppError {
    fn from(err: MediaToolError) -> Self {
        match err {
            MediaToolError::Io(e) => AppError::Internal(format!("Media staging failed: {}", e)),
            other => AppError::MediaProcessing(other.to_string()),
        }
    }
}
