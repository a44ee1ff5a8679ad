//! Test helpers: build AppState and router around in-memory collaborators.
//!
//! The metadata store is a mutex-guarded map, ffprobe/ffmpeg are replaced by
//! fakes, and objects land in a temp dir behind `LocalStorage`. Any one of the
//! media tools or the object store can be swapped for a failing double.

pub mod fixtures;
pub mod mocks;

use axum_test::TestServer;
use chrono::Utc;
use mocks::{
    FailingInspector, FailingRemuxer, FailingStorage, FakeInspector, MockVideoRepository,
    ReorderingRemuxer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::JwtService;
use tubely_api::services::upload::{
    IngestionLimits, IngestionService, MediaLimits, ThumbnailCache, ThumbnailStrategy,
};
use tubely_api::setup::routes::{build_router, RouterOptions};
use tubely_api::state::AppState;
use tubely_core::Video;
use tubely_processing::{MediaInspector, MediaRemuxer, ObjectPublisher, Stager};
use tubely_storage::{LocalStorage, Storage};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-with-enough-length";
pub const TEST_PUBLIC_BASE_URL: &str = "http://localhost:8091";

/// Collaborator to swap for one that always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailingStage {
    Inspect,
    NoStreams,
    Transform,
    Storage,
}

#[derive(Debug, Clone)]
pub struct TestAppOptions {
    pub memory_thumbnails: bool,
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
    /// Dimensions the fake inspector reports for every file.
    pub dimensions: (u32, u32),
    pub failing: Option<FailingStage>,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            memory_thumbnails: false,
            max_video_bytes: 1024 * 1024,
            max_thumbnail_bytes: 64 * 1024,
            dimensions: (1920, 1080),
            failing: None,
        }
    }
}

/// Test application: server plus handles on everything it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<MockVideoRepository>,
    pub ingestion: Arc<IngestionService>,
    pub thumbnails: Arc<ThumbnailCache>,
    pub jwt: JwtService,
    pub objects_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub fn token_for(&self, user_id: Uuid) -> String {
        self.jwt
            .issue_token(user_id, chrono::Duration::hours(1))
            .expect("Failed to issue test token")
    }

    /// Insert a record owned by `owner` with no media yet.
    pub fn seed_video(&self, owner: Uuid) -> Video {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: "Integration clip".to_string(),
            description: "Seeded by tests".to_string(),
            thumbnail_url: None,
            video_url: None,
            user_id: owner,
        };
        self.repository.insert(video.clone());
        video
    }

    pub fn stored_objects(&self) -> Vec<PathBuf> {
        files_under(self.objects_dir.path())
    }

    pub fn staged_files(&self) -> Vec<PathBuf> {
        files_under(self.staging_dir.path())
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestAppOptions::default()).await
}

pub async fn setup_test_app_with(options: TestAppOptions) -> TestApp {
    let objects_dir = tempfile::tempdir().expect("Failed to create objects dir");
    let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");

    let storage: Arc<dyn Storage> = if options.failing == Some(FailingStage::Storage) {
        Arc::new(FailingStorage)
    } else {
        Arc::new(
            LocalStorage::new(
                objects_dir.path(),
                format!("{}/assets", TEST_PUBLIC_BASE_URL),
            )
            .await
            .expect("Failed to create local storage"),
        )
    };

    let repository = Arc::new(MockVideoRepository::default());
    let thumbnails = Arc::new(ThumbnailCache::new());
    let strategy = if options.memory_thumbnails {
        ThumbnailStrategy::Memory {
            cache: thumbnails.clone(),
            public_base_url: TEST_PUBLIC_BASE_URL.to_string(),
        }
    } else {
        ThumbnailStrategy::ObjectStore
    };

    let limits = IngestionLimits {
        video: MediaLimits {
            max_bytes: options.max_video_bytes,
            allowed_content_types: vec!["video/mp4".to_string()],
        },
        thumbnail: MediaLimits {
            max_bytes: options.max_thumbnail_bytes,
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        },
    };
    let max_upload_bytes = limits.max_upload_bytes();

    let (width, height) = options.dimensions;
    let inspector: Arc<dyn MediaInspector> = match options.failing {
        Some(FailingStage::Inspect) => Arc::new(FailingInspector { no_streams: false }),
        Some(FailingStage::NoStreams) => Arc::new(FailingInspector { no_streams: true }),
        _ => Arc::new(FakeInspector { width, height }),
    };
    let remuxer: Arc<dyn MediaRemuxer> = match options.failing {
        Some(FailingStage::Transform) => Arc::new(FailingRemuxer),
        _ => Arc::new(ReorderingRemuxer),
    };

    let ingestion = Arc::new(IngestionService::new(
        repository.clone(),
        Stager::new(staging_dir.path()),
        inspector,
        remuxer,
        ObjectPublisher::new(storage),
        limits,
        strategy,
    ));

    let jwt = JwtService::new(TEST_JWT_SECRET);
    let state = Arc::new(AppState {
        ingestion: ingestion.clone(),
        jwt: jwt.clone(),
        thumbnails: thumbnails.clone(),
    });

    let router = build_router(
        state,
        RouterOptions {
            max_upload_bytes,
            assets_dir: Some(objects_dir.path().to_path_buf()),
        },
    );
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        repository,
        ingestion,
        thumbnails,
        jwt,
        objects_dir,
        staging_dir,
    }
}

/// Regular files below `dir`, recursively.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}

/// Path component of a URL handed out by the local backend, e.g. `/assets/landscape/x.mp4`.
pub fn asset_path(url: &str) -> String {
    url.strip_prefix(TEST_PUBLIC_BASE_URL)
        .unwrap_or_else(|| panic!("unexpected URL {url}"))
        .to_string()
}
