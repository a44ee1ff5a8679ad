use crate::staging::StagedArtifact;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tubely_core::AppError;
use tubely_storage::{ObjectReader, Storage, StorageError};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to open staged artifact: {0}")]
    Artifact(#[source] io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(#[from] StorageError),
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Artifact(e) => AppError::Internal(format!("Staged file unreadable: {}", e)),
            PublishError::UploadFailed(e) => AppError::Storage(e.to_string()),
        }
    }
}

/// Streams staged artifacts into object storage.
#[derive(Clone)]
pub struct ObjectPublisher {
    storage: Arc<dyn Storage>,
}

impl ObjectPublisher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload `artifact` under `key` and return the object's public URL.
    #[tracing::instrument(skip(self, artifact), fields(size_bytes = artifact.len(), backend = %self.storage.backend_type()))]
    pub async fn publish(
        &self,
        artifact: &StagedArtifact,
        key: &str,
        content_type: &str,
    ) -> Result<String, PublishError> {
        let file = artifact.open().await.map_err(PublishError::Artifact)?;
        let reader: ObjectReader = Box::pin(file);

        let url = self
            .storage
            .put_stream(key, content_type, Some(artifact.len()), reader)
            .await?;

        Ok(url)
    }
}
