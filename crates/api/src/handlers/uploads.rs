//! Handlers for publishing videos: direct uploads and remote ingestion.
//!
//! Both publish forms are `multipart/form-data` so a thumbnail image can
//! travel with the metadata. The video bytes themselves never pass through
//! this service: direct uploads go straight to the ingestion service using
//! the target from `GET /videos/upload-url`, remote uploads are fetched by
//! the ingestion service from `video_url`.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use vidfeed_core::validation::{PublishFields, RemoteSubmission};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Fields accepted by the publish forms. Unknown fields are ignored.
#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    file_id: Option<String>,
    video_url: Option<String>,
    thumbnail: Option<Vec<u8>>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            let slot = match name.as_str() {
                "title" => &mut form.title,
                "description" => &mut form.description,
                "file_id" => &mut form.file_id,
                "video_url" => &mut form.video_url,
                "thumbnail" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.thumbnail = Some(data.to_vec());
                    continue;
                }
                _ => continue,
            };
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            *slot = Some(text);
        }

        Ok(form)
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// GET /api/v1/videos/upload-url
///
/// Pass-through of the ingestion service's direct-upload target.
pub async fn upload_url(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let target = state.ingestion.upload_target().await?;

    tracing::debug!(user_id = auth.user_id, "Upload target issued");

    Ok(Json(DataResponse { data: target }))
}

/// POST /api/v1/videos
///
/// Finalize a direct upload: `title`, `description`, `file_id` and an
/// optional `thumbnail`.
pub async fn publish(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = UploadForm::read(multipart).await?;
    let fields = PublishFields::new(
        text(&form.title),
        text(&form.description),
        text(&form.file_id),
    );

    let video = state
        .publisher
        .publish(auth.user_id, fields, form.thumbnail)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}

/// POST /api/v1/videos/remote-uploads
///
/// Start a remote ingestion of `video_url`. The video is published with
/// `title` and `description` once the ingestion service finishes.
pub async fn start_remote(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = UploadForm::read(multipart).await?;
    let submission = RemoteSubmission::new(
        text(&form.title),
        text(&form.description),
        text(&form.video_url),
    );

    let snapshot = state
        .remote_jobs
        .start(auth.user_id, submission, form.thumbnail)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: snapshot })))
}

/// GET /api/v1/videos/remote-uploads/{remote_id}
pub async fn remote_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(remote_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.remote_jobs.snapshot(&remote_id, auth.user_id).await?;

    Ok(Json(DataResponse { data: snapshot }))
}

/// DELETE /api/v1/videos/remote-uploads/{remote_id}
///
/// Cancellation lands at the next tick boundary, so the returned snapshot
/// may still show the job polling.
pub async fn cancel_remote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(remote_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.remote_jobs.cancel(&remote_id, auth.user_id).await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: snapshot })))
}
