#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use vidfeed_api::auth::jwt::{generate_access_token, JwtConfig};
use vidfeed_api::config::{IngestConfig, ServerConfig};
use vidfeed_api::router::build_app_router;
use vidfeed_api::state::AppState;
use vidfeed_core::ingestion::{Progress, StatusReport};
use vidfeed_core::types::DbId;
use vidfeed_db::models::user::{CreateUser, User};
use vidfeed_db::models::video::{CreateVideo, Video};
use vidfeed_db::repositories::{UserRepo, VideoRepo};
use vidfeed_ingest::{ImageHost, IngestError, IngestionBackend};

const MULTIPART_BOUNDARY: &str = "vidfeed-test-boundary";

/// Build a test `ServerConfig` with safe defaults and a fast poll interval.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
        },
        ingest: IngestConfig {
            poll_interval_ms: 5,
            job_timeout_secs: 30,
            ..IngestConfig::default()
        },
    }
}

/// In-memory ingestion service.
///
/// Source URLs containing `unreachable` fail to submit, URLs containing
/// `slow` never finish, and everything else finishes on the second poll
/// with file id `remote-{remote_id}`.
#[derive(Default)]
pub struct StubIngestion {
    submitted: AtomicUsize,
    polls: AtomicUsize,
}

impl StubIngestion {
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestionBackend for StubIngestion {
    async fn upload_target(&self) -> Result<Value, IngestError> {
        Ok(serde_json::json!({ "url": "https://upload.test/session/abc" }))
    }

    async fn submit(&self, source_url: &str) -> Result<String, IngestError> {
        if source_url.contains("unreachable") {
            return Err(IngestError::ApiError {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        let n = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        let prefix = if source_url.contains("slow") { "S" } else { "R" };
        Ok(format!("{prefix}{n}"))
    }

    async fn poll(&self, remote_id: &str) -> Result<StatusReport, IngestError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        if remote_id.starts_with('S') || n % 2 == 0 {
            return Ok(StatusReport::Processing(Progress {
                bytes_loaded: Some(1000),
                bytes_total: Some(5000),
            }));
        }
        Ok(StatusReport::Finished {
            file_id: format!("remote-{remote_id}"),
        })
    }
}

/// Image host that always fails.
pub struct FailingImageHost;

#[async_trait]
impl ImageHost for FailingImageHost {
    async fn upload(&self, _image: &[u8]) -> Result<String, IngestError> {
        Err(IngestError::ApiError {
            status: 500,
            body: "image host down".into(),
        })
    }
}

/// Image host that accepts everything.
pub struct AcceptingImageHost;

#[async_trait]
impl ImageHost for AcceptingImageHost {
    async fn upload(&self, image: &[u8]) -> Result<String, IngestError> {
        Ok(format!("https://img.test/{}.png", image.len()))
    }
}

/// Build the application state the way `main.rs` does, with in-memory
/// collaborators.
pub fn test_state(
    pool: PgPool,
    ingestion: Arc<dyn IngestionBackend>,
    image_host: Option<Arc<dyn ImageHost>>,
) -> AppState {
    AppState::new(pool, test_config(), ingestion, image_host)
}

/// Full router with a [`StubIngestion`] and no image host.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(StubIngestion::default()), None)
}

pub fn build_test_app_with(
    pool: PgPool,
    ingestion: Arc<dyn IngestionBackend>,
    image_host: Option<Arc<dyn ImageHost>>,
) -> Router {
    let state = test_state(pool, ingestion, image_host);
    build_app_router(state, &test_config())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, 60, &test_config().jwt).unwrap()
}

pub async fn user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn video(pool: &PgPool, uploader_id: DbId, title: &str) -> Video {
    VideoRepo::create(
        pool,
        &CreateVideo {
            title: title.to_string(),
            description: format!("About {title}"),
            external_file_id: format!("file-{title}"),
            thumbnail_url: None,
            uploader_id,
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn builder(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, path: &str) -> Response<Body> {
    get_as(app, path, None).await
}

pub async fn get_as(app: Router, path: &str, token: Option<&str>) -> Response<Body> {
    let request = builder(Method::GET, path, token).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, path: &str, token: Option<&str>) -> Response<Body> {
    let request = builder(Method::POST, path, token).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, path: &str, token: Option<&str>, body: Value) -> Response<Body> {
    json_request(app, Method::POST, path, token, body).await
}

pub async fn put_json(app: Router, path: &str, token: Option<&str>, body: Value) -> Response<Body> {
    json_request(app, Method::PUT, path, token, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> Response<Body> {
    let request = builder(method, path, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, path: &str, token: Option<&str>) -> Response<Body> {
    let request = builder(Method::DELETE, path, token).body(Body::empty()).unwrap();
    send(app, request).await
}

/// POST a `multipart/form-data` body with text fields and an optional
/// `thumbnail` file part.
pub async fn post_multipart(
    app: Router,
    path: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    thumbnail: Option<&[u8]>,
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = thumbnail {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"thumb.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let request = builder(Method::POST, path, token)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
