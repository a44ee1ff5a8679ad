//! Tubely Processing Library
//!
//! The stages of media ingestion that touch bytes: staging inbound streams to
//! disk, probing and classifying video, fast-start remuxing, and publishing the
//! result to object storage. Sequencing and metadata commits live in the API's
//! ingestion service.

pub mod error;
pub mod staging;
pub mod traits;
pub mod upload;
pub mod video;

pub use error::MediaToolError;
pub use staging::{StageError, StagedArtifact, Stager};
pub use traits::{MediaInspector, MediaRemuxer, VideoProperties};
pub use upload::{ObjectPublisher, PublishError};
pub use video::{
    classify, classify_orientation, fast_start, is_fast_start, FfmpegRemuxer, FfprobeInspector,
};
