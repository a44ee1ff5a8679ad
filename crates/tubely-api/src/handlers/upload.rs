//! Multipart plumbing shared by the upload endpoints.

use crate::auth::CallerContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::Multipart;
use futures::TryStreamExt;
use std::io;
use tokio_util::io::StreamReader;
use tubely_core::{AppError, MediaKind, Video};
use uuid::Uuid;

pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
}

/// Authorize the caller, find the kind's form field and stream it through
/// the ingestion service.
pub(crate) async fn ingest_upload(
    state: &AppState,
    caller: CallerContext,
    raw_video_id: &str,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<Video, HttpAppError> {
    let video_id = parse_video_id(raw_video_id)?;
    let video = state.ingestion.authorize(video_id, caller.user_id).await?;
    let field_name = kind.form_field();

    loop {
        let field = multipart.next_field().await?.ok_or_else(|| {
            AppError::BadRequest(format!("Missing form field: {}", field_name))
        })?;

        if field.name() != Some(field_name) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        tracing::debug!(
            video_id = %video_id,
            content_type = content_type.as_deref().unwrap_or("none"),
            file_name = field.file_name().unwrap_or("none"),
            "Receiving upload"
        );

        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);

        let video = state
            .ingestion
            .ingest(video, kind, content_type.as_deref(), reader)
            .await?;
        return Ok(video);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_video_id("not-a-uuid"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid ID"
        ));
    }
}
