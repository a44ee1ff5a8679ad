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

/// Upload a thumbnail image (`thumbnail` form field) for an existing record.
#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "uploads",
    params(("video_id" = String, Path, description = "Video record ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail uploaded", body = Video),
        (status = 400, description = "Invalid ID, content type or multipart body", body = ErrorResponse),
        (status = 401, description = "Missing token or not the video author", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let video = ingest_upload(&state, caller, &video_id, MediaKind::Thumbnail, multipart).await?;
    Ok(Json(video))
}
