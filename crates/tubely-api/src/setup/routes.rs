//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Headroom for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Largest file any upload endpoint accepts.
    pub max_upload_bytes: u64,
    /// Served under `/assets` when objects live on the local filesystem.
    pub assets_dir: Option<PathBuf>,
}

/// Build the HTTP surface around an already-initialized state.
pub fn build_router(state: Arc<AppState>, options: RouterOptions) -> Router {
    let body_limit =
        usize::try_from(options.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX);

    let upload_routes = Router::new()
        .route("/api/video_upload/{video_id}", post(handlers::video_upload::upload_video))
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(handlers::thumbnail_upload::upload_thumbnail),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable());

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route(
            "/api/thumbnails/{video_id}",
            get(handlers::thumbnail_get::get_thumbnail),
        );

    let mut app = public_routes.merge(upload_routes).with_state(state);

    if let Some(dir) = options.assets_dir {
        tracing::info!(dir = %dir.display(), "Serving local objects under /assets");
        app = app.nest_service("/assets", ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer()),
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
