//! Video inspection via ffprobe, and orientation classification

use crate::error::MediaToolError;
use crate::traits::{MediaInspector, VideoProperties};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tubely_core::Orientation;

/// Reject binary paths that contain shell metacharacters.
pub(crate) fn validate_binary_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Invalid binary path: {:?}", path));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Pull width and height out of `ffprobe -print_format json -show_streams` output.
///
/// Both dimensions come from the same stream entry.
pub fn parse_probe_output(stdout: &[u8]) -> Result<VideoProperties, MediaToolError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaToolError::ProbeFailed(format!("malformed ffprobe output: {}", e)))?;

    let stream = probe.streams.first().ok_or(MediaToolError::NoStreams)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(VideoProperties { width, height }),
        _ => Err(MediaToolError::ProbeFailed(
            "stream is missing width or height".to_string(),
        )),
    }
}

/// Bucket a frame size as 16:9, 9:16 or neither.
///
/// Ratios are compared by cross-multiplying in integers, accepting up to 2%
/// relative deviation so sizes like 854x480 still count as 16:9.
pub fn classify_orientation(width: u32, height: u32) -> Orientation {
    if width == 0 || height == 0 {
        return Orientation::Other;
    }

    let (w, h) = (u64::from(width), u64::from(height));

    // |w/h - 16/9| <= 2% of 16/9  <=>  |9w - 16h| * 50 <= 16h
    if (w * 9).abs_diff(h * 16) * 50 <= h * 16 {
        return Orientation::Landscape;
    }
    // |h/w - 16/9| <= 2% of 16/9  <=>  |16w - 9h| * 50 <= 16w
    if (w * 16).abs_diff(h * 9) * 50 <= w * 16 {
        return Orientation::Portrait;
    }

    Orientation::Other
}

/// Probe `path` and classify its first video stream.
pub async fn classify(
    inspector: &dyn MediaInspector,
    path: &Path,
) -> Result<Orientation, MediaToolError> {
    let props = inspector.inspect(path).await?;
    let orientation = classify_orientation(props.width, props.height);

    tracing::debug!(
        width = props.width,
        height = props.height,
        orientation = %orientation,
        "Video classified"
    );

    Ok(orientation)
}

/// [`MediaInspector`] backed by the `ffprobe` binary.
pub struct FfprobeInspector {
    ffprobe_path: String,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_binary_path(&ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn inspect(&self, path: &Path) -> Result<VideoProperties, MediaToolError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaToolError::ProbeFailed(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(MediaToolError::ProbeFailed(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let props = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = props.width,
            height = props.height,
            "Video probe completed"
        );

        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_examples() {
        assert_eq!(classify_orientation(1920, 1080), Orientation::Landscape);
        assert_eq!(classify_orientation(1080, 1920), Orientation::Portrait);
        assert_eq!(classify_orientation(800, 800), Orientation::Other);
    }

    #[test]
    fn test_classification_tolerates_rounded_sizes() {
        // 854x480 and 1366x768 are not exact 16:9 but are treated as such.
        assert_eq!(classify_orientation(854, 480), Orientation::Landscape);
        assert_eq!(classify_orientation(1366, 768), Orientation::Landscape);
        assert_eq!(classify_orientation(480, 854), Orientation::Portrait);
        assert_eq!(classify_orientation(608, 1080), Orientation::Portrait);
    }

    #[test]
    fn test_classification_outside_tolerance() {
        assert_eq!(classify_orientation(1024, 768), Orientation::Other);
        assert_eq!(classify_orientation(2560, 1080), Orientation::Other);
        assert_eq!(classify_orientation(0, 1080), Orientation::Other);
        assert_eq!(classify_orientation(1920, 0), Orientation::Other);
    }

    #[test]
    fn test_parse_reads_dimensions_from_one_stream() {
        let stdout = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "width": 1920, "height": 1080},
                {"index": 1, "codec_type": "video", "width": 320, "height": 240}
            ]
        }"#;
        let props = parse_probe_output(stdout).unwrap();
        assert_eq!(
            props,
            VideoProperties {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn test_parse_no_streams() {
        assert!(matches!(
            parse_probe_output(br#"{"streams": []}"#),
            Err(MediaToolError::NoStreams)
        ));
        assert!(matches!(
            parse_probe_output(br#"{}"#),
            Err(MediaToolError::NoStreams)
        ));
    }

    #[test]
    fn test_parse_malformed_output() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(MediaToolError::ProbeFailed(_))
        ));
        assert!(matches!(
            parse_probe_output(br#"{"streams": [{"codec_type": "audio"}]}"#),
            Err(MediaToolError::ProbeFailed(_))
        ));
    }

    #[test]
    fn test_binary_path_validation() {
        assert!(FfprobeInspector::new("ffprobe").is_ok());
        assert!(FfprobeInspector::new("/usr/bin/ffprobe").is_ok());
        assert!(FfprobeInspector::new("ffprobe; rm -rf /").is_err());
        assert!(FfprobeInspector::new("").is_err());
    }
}
