//! Runs the real ffprobe/ffmpeg adapters. Skipped when the binaries are not on PATH.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tubely_core::Orientation;
use tubely_processing::{
    classify, fast_start, is_fast_start, FfmpegRemuxer, FfprobeInspector, MediaInspector,
    MediaToolError, Stager,
};

async fn tools_available() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        let ok = Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);
        if !ok {
            eprintln!("skipping: {tool} not available");
            return false;
        }
    }
    true
}

/// A one-second test pattern; the plain mp4 muxer writes moov after mdat.
async fn generate_clip(path: &Path, size: &str) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size={size}:duration=1:rate=10"))
        .args(["-c:v", "mpeg4", "-f", "mp4"])
        .arg(path)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "ffmpeg failed to generate test clip");
}

#[tokio::test]
async fn test_probe_and_classify_landscape_clip() {
    if !tools_available().await {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("landscape.mp4");
    generate_clip(&clip, "1280x720").await;

    let inspector = FfprobeInspector::new("ffprobe").unwrap();
    let props = inspector.inspect(&clip).await.unwrap();
    assert_eq!((props.width, props.height), (1280, 720));

    assert_eq!(
        classify(&inspector, &clip).await.unwrap(),
        Orientation::Landscape
    );
}

#[tokio::test]
async fn test_probe_rejects_non_media() {
    if !tools_available().await {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.mp4");
    tokio::fs::write(&bogus, b"definitely not a video").await.unwrap();

    let inspector = FfprobeInspector::new("ffprobe").unwrap();
    let err = inspector.inspect(&bogus).await.unwrap_err();
    assert!(matches!(
        err,
        MediaToolError::ProbeFailed(_) | MediaToolError::NoStreams
    ));
}

#[tokio::test]
async fn test_fast_start_moves_index_and_is_idempotent() {
    if !tools_available().await {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("portrait.mp4");
    generate_clip(&clip, "360x640").await;

    let stager = Stager::new(dir.path());
    let file = tokio::fs::File::open(&clip).await.unwrap();
    let staged = stager.stage(file, 50 * 1024 * 1024).await.unwrap();
    assert!(!is_fast_start(staged.path()).await.unwrap());

    let remuxer = FfmpegRemuxer::new("ffmpeg").unwrap();
    let once = fast_start(&remuxer, &stager, &staged).await.unwrap();
    assert!(is_fast_start(once.path()).await.unwrap());

    let twice = fast_start(&remuxer, &stager, &once).await.unwrap();
    assert!(is_fast_start(twice.path()).await.unwrap());

    let inspector = FfprobeInspector::new("ffprobe").unwrap();
    assert_eq!(
        inspector.inspect(once.path()).await.unwrap(),
        inspector.inspect(twice.path()).await.unwrap()
    );
    assert_eq!(
        classify(&inspector, twice.path()).await.unwrap(),
        Orientation::Portrait
    );
}
