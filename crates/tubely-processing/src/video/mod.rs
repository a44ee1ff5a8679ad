//! Video-specific stages: probing, classification and fast-start remuxing.

pub mod atoms;
pub mod processor;
pub mod transformer;

pub use atoms::is_fast_start;
pub use processor::{classify, classify_orientation, parse_probe_output, FfprobeInspector};
pub use transformer::{fast_start, FfmpegRemuxer};
