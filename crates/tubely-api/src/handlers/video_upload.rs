use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::upload::ingest_upload;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::{MediaKind, Video};

/// Upload a video for an existing record.
///
/// The `video` form field must be `video/mp4`. The file is classified by
/// orientation, remuxed for fast start and published; the record's
/// `video_url` points at the result.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(("video_id" = String, Path, description = "Video record ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded", body = Video),
        (status = 400, description = "Invalid ID, content type or multipart body", body = ErrorResponse),
        (status = 401, description = "Missing token or not the video author", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Processing, storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let video = ingest_upload(&state, caller, &video_id, MediaKind::Video, multipart).await?;
    Ok(Json(video))
}
