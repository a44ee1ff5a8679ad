//! Stream staging
//!
//! Inbound upload bodies are copied to a uniquely named temp file so later
//! stages can make as many independent passes over the bytes as they need.
//! The file is removed when the [`StagedArtifact`] is dropped, on every path.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::AppError;

const STAGE_PREFIX: &str = "tubely-upload-";
const COPY_BUFFER_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Upload exceeds the {max} byte limit")]
    TooLarge { max: u64 },

    /// The client side of the stream failed: early close, malformed multipart.
    #[error("Failed to read upload stream: {0}")]
    Inbound(#[source] io::Error),

    /// Local disk failure while writing the staging file.
    #[error("Failed to write staging file: {0}")]
    Io(#[source] io::Error),
}

impl From<StageError> for AppError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::TooLarge { max } => AppError::PayloadTooLarge(format!(
                "File exceeds the maximum allowed size of {} bytes",
                max
            )),
            StageError::Inbound(e) => {
                AppError::BadRequest(format!("Failed to read upload: {}", e))
            }
            StageError::Io(e) => AppError::Internal(format!("Failed to stage upload: {}", e)),
        }
    }
}

/// A local, seekable copy of uploaded or derived bytes.
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    len: u64,
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A fresh read handle positioned at offset 0.
    pub async fn open(&self) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.file.path()).await
    }

    /// Re-read the length after an external process wrote to the file.
    pub async fn refresh_len(&mut self) -> io::Result<u64> {
        self.len = tokio::fs::metadata(self.file.path()).await?.len();
        Ok(self.len)
    }
}

/// Creates staged artifacts in a shared directory.
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
}

impl Stager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// An empty artifact for a process to write into.
    pub fn allocate(&self) -> io::Result<StagedArtifact> {
        let file = tempfile::Builder::new()
            .prefix(STAGE_PREFIX)
            .tempfile_in(&self.dir)?;
        Ok(StagedArtifact { file, len: 0 })
    }

    /// Copy `reader` to a new artifact, failing on the first byte past `max_bytes`.
    #[tracing::instrument(skip(self, reader), fields(staging_dir = %self.dir.display()))]
    pub async fn stage<R>(&self, mut reader: R, max_bytes: u64) -> Result<StagedArtifact, StageError>
    where
        R: AsyncRead + Unpin,
    {
        let start = std::time::Instant::now();
        let mut artifact = self.allocate().map_err(StageError::Io)?;

        let std_file = artifact.file.reopen().map_err(StageError::Io)?;
        let mut out = tokio::fs::File::from_std(std_file);

        let mut buf = vec![0u8; COPY_BUFFER_BYTES];
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buf).await.map_err(StageError::Inbound)?;
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > max_bytes {
                tracing::debug!(max_bytes, "Upload exceeded staging limit");
                return Err(StageError::TooLarge { max: max_bytes });
            }

            out.write_all(&buf[..n]).await.map_err(StageError::Io)?;
        }

        out.flush().await.map_err(StageError::Io)?;
        artifact.len = total;

        tracing::debug!(
            path = %artifact.path().display(),
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields some bytes, then fails like a dropped connection.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_stage_within_limit() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(dir.path());
        let data = vec![7u8; 200_000];

        let artifact = stager.stage(&data[..], 200_000).await.unwrap();
        assert_eq!(artifact.len(), 200_000);

        let name = artifact.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(STAGE_PREFIX));

        // Every open starts from the beginning.
        for _ in 0..2 {
            let mut file = artifact.open().await.unwrap();
            let mut read_back = Vec::new();
            file.read_to_end(&mut read_back).await.unwrap();
            assert_eq!(read_back, data);
        }
    }

    #[tokio::test]
    async fn test_stage_rejects_first_byte_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(dir.path());
        let data = vec![1u8; 1025];

        let err = stager.stage(&data[..], 1024).await.unwrap_err();
        assert!(matches!(err, StageError::TooLarge { max: 1024 }));

        // The aborted artifact is gone.
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inbound_failure_is_distinct_from_disk_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(dir.path());

        let err = stager
            .stage(BrokenReader { sent: false }, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Inbound(_)));

        let app: AppError = err.into();
        assert!(matches!(app, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_artifact_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(dir.path());

        let artifact = stager.stage(&b"bytes"[..], 16).await.unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_stages_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Stager::new(dir.path());

        let (a, b) = tokio::join!(
            stager.stage(&b"first"[..], 16),
            stager.stage(&b"second"[..], 16)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        assert_eq!(tokio::fs::read(a.path()).await.unwrap(), b"first");
        assert_eq!(tokio::fs::read(b.path()).await.unwrap(), b"second");
    }
}
