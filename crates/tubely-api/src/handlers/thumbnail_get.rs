use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::upload::parse_video_id;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tubely_core::AppError;

/// Serve a thumbnail held in memory (`THUMBNAIL_STORAGE=memory`).
#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    tag = "uploads",
    params(("video_id" = String, Path, description = "Video record ID")),
    responses(
        (status = 200, description = "Thumbnail bytes with its stored content type"),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 404, description = "Thumbnail not found", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Response, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    let thumbnail = state
        .thumbnails
        .get(video_id)
        .await
        .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, thumbnail.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        thumbnail.data,
    )
        .into_response())
}
