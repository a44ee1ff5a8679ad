use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tubely_core::{AppError, MediaKind, Video};
use tubely_db::VideoRepository;
use tubely_processing::{MediaInspector, MediaRemuxer, MediaToolError, VideoProperties};
use tubely_storage::{ObjectReader, Storage, StorageBackend, StorageError, StorageResult};
use uuid::Uuid;

/// Map-backed metadata store with switches to make updates fail.
#[derive(Default)]
pub struct MockVideoRepository {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: AtomicBool,
    stalled: Mutex<Option<Arc<StalledUpdate>>>,
    updates: AtomicUsize,
}

/// An update that signals `reached`, waits for `release`, then fails.
#[derive(Default)]
pub struct StalledUpdate {
    pub reached: Notify,
    pub release: Notify,
}

impl MockVideoRepository {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Make only the next update stall and fail; later updates go through.
    pub fn stall_next_update(&self) -> Arc<StalledUpdate> {
        let stall = Arc::new(StalledUpdate::default());
        *self.stalled.lock().unwrap() = Some(stall.clone());
        stall
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRepository for MockVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.get(id))
    }

    async fn set_media_url(&self, id: Uuid, kind: MediaKind, url: &str) -> Result<Video, AppError> {
        let stalled = self.stalled.lock().unwrap().take();
        if let Some(stall) = stalled {
            stall.reached.notify_one();
            stall.release.notified().await;
            return Err(AppError::Internal("simulated metadata outage".to_string()));
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("simulated metadata outage".to_string()));
        }

        let mut videos = self.videos.lock().unwrap();
        let existing = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        *existing = existing.with_media_url(kind, url.to_string());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(existing.clone())
    }
}

/// Reports fixed dimensions for any file.
pub struct FakeInspector {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn inspect(&self, _path: &Path) -> Result<VideoProperties, MediaToolError> {
        Ok(VideoProperties {
            width: self.width,
            height: self.height,
        })
    }
}

/// Moves every `moov` box ahead of the first `mdat`, like `-movflags faststart`.
pub struct ReorderingRemuxer;

#[async_trait]
impl MediaRemuxer for ReorderingRemuxer {
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        let bytes = tokio::fs::read(input).await?;
        let boxes = split_boxes(&bytes)
            .ok_or_else(|| MediaToolError::TransformFailed("not an mp4 container".to_string()))?;

        let mut head = Vec::new();
        let mut moov = Vec::new();
        let mut tail = Vec::new();
        let mut seen_mdat = false;
        for (kind, data) in boxes {
            match &kind {
                b"moov" => moov.push(data),
                b"mdat" => {
                    seen_mdat = true;
                    tail.push(data);
                }
                _ if seen_mdat => tail.push(data),
                _ => head.push(data),
            }
        }

        let out: Vec<u8> = head
            .into_iter()
            .chain(moov)
            .chain(tail)
            .flatten()
            .copied()
            .collect();
        tokio::fs::write(output, out).await?;
        Ok(())
    }
}

fn split_boxes(bytes: &[u8]) -> Option<Vec<([u8; 4], &[u8])>> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let header = bytes.get(offset..offset + 8)?;
        let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];
        if size < 8 {
            return None;
        }
        out.push((kind, bytes.get(offset..offset + size)?));
        offset += size;
    }
    Some(out)
}

/// Inspector that fails the way ffprobe does on a broken or audio-only file.
pub struct FailingInspector {
    pub no_streams: bool,
}

#[async_trait]
impl MediaInspector for FailingInspector {
    async fn inspect(&self, _path: &Path) -> Result<VideoProperties, MediaToolError> {
        if self.no_streams {
            Err(MediaToolError::NoStreams)
        } else {
            Err(MediaToolError::ProbeFailed("ffprobe exited with status 1".to_string()))
        }
    }
}

pub struct FailingRemuxer;

#[async_trait]
impl MediaRemuxer for FailingRemuxer {
    async fn remux_fast_start(&self, _input: &Path, _output: &Path) -> Result<(), MediaToolError> {
        Err(MediaToolError::TransformFailed("ffmpeg exited with status 1".to_string()))
    }
}

/// Object store that rejects every upload.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn put_stream(
        &self,
        key: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        _reader: ObjectReader,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed(format!("bucket unavailable for {key}")))
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn object_url(&self, key: &str) -> String {
        format!("http://unreachable.invalid/{key}")
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
