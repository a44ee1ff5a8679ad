//! Fast-start remuxing via ffmpeg

use super::atoms;
use super::processor::validate_binary_path;
use crate::error::MediaToolError;
use crate::staging::{StagedArtifact, Stager};
use crate::traits::MediaRemuxer;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// [`MediaRemuxer`] backed by the `ffmpeg` binary.
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_binary_path(&ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl MediaRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        let output_status = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MediaToolError::TransformFailed(format!("failed to execute ffmpeg: {}", e))
            })?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(MediaToolError::TransformFailed(format!(
                "ffmpeg exited with {}: {}",
                output_status.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Remux `input` into a new artifact with its index ahead of the media payload.
///
/// The output is scanned afterwards and rejected unless `moov` precedes `mdat`.
#[tracing::instrument(skip_all, fields(input_bytes = input.len()))]
pub async fn fast_start(
    remuxer: &dyn MediaRemuxer,
    stager: &Stager,
    input: &StagedArtifact,
) -> Result<StagedArtifact, MediaToolError> {
    let start = std::time::Instant::now();
    let mut output = stager.allocate()?;

    remuxer
        .remux_fast_start(input.path(), output.path())
        .await?;

    let output_len = output.refresh_len().await?;

    let ordered = atoms::is_fast_start(output.path())
        .await
        .map_err(|e| MediaToolError::TransformFailed(format!("unreadable remux output: {}", e)))?;
    if !ordered {
        return Err(MediaToolError::TransformFailed(
            "moov atom does not precede mdat in remux output".to_string(),
        ));
    }

    tracing::info!(
        output_bytes = output_len,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Fast-start remux completed"
    );

    Ok(output)
}
