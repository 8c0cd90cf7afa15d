//! Handlers for engagement (views, likes, comments) and owner edits.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use vidfeed_core::error::CoreError;
use vidfeed_core::types::DbId;
use vidfeed_core::validation::{CommentText, VideoEdit};
use vidfeed_db::models::comment::CreateComment;
use vidfeed_db::models::video::{UpdateVideo, Video};
use vidfeed_db::repositories::{CommentRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /videos/{id}/comments`.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Request body for `PUT /videos/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewRecorded {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

/// POST /api/v1/videos/{id}/view
///
/// Best-effort: always 200. `success` is false when the video is unknown or
/// the increment failed.
pub async fn record_view(
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> impl IntoResponse {
    let success = match VideoRepo::increment_views(&state.pool, video_id).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(video_id, error = %e, "Failed to record view");
            false
        }
    };

    Json(DataResponse {
        data: ViewRecorded { success },
    })
}

/// POST /api/v1/videos/{id}/like
///
/// Flip the caller's like. Returns the new count and membership.
pub async fn toggle_like(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let state_after = VideoRepo::toggle_like(&state.pool, video_id, auth.user_id)
        .await?
        .ok_or(video_not_found(video_id))?;

    tracing::info!(
        video_id,
        user_id = auth.user_id,
        is_liked = state_after.is_liked,
        "Like toggled",
    );

    Ok(Json(DataResponse { data: state_after }))
}

/// POST /api/v1/videos/{id}/comments
pub async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<AddCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let body = CommentText::new(&input.text);
    body.check()?;

    if !VideoRepo::exists(&state.pool, video_id).await? {
        return Err(video_not_found(video_id));
    }

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            video_id,
            author_id: auth.user_id,
            text: body.text,
        },
    )
    .await?;

    tracing::info!(video_id, comment_id = comment.id, user_id = auth.user_id, "Comment added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /api/v1/videos/{id}/comments
///
/// Newest first. An unknown video is a 404 rather than an empty list.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !VideoRepo::exists(&state.pool, video_id).await? {
        return Err(video_not_found(video_id));
    }

    let comments = CommentRepo::list_for_video(&state.pool, video_id).await?;

    Ok(Json(DataResponse { data: comments }))
}

// ---------------------------------------------------------------------------
// Owner edits
// ---------------------------------------------------------------------------

/// PUT /api/v1/videos/{id}
pub async fn update_video(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<UpdateVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let edit = VideoEdit::new(input.title.as_deref(), input.description.as_deref());
    edit.check()?;

    owned_video(&state, video_id, auth.user_id).await?;

    let video = VideoRepo::update_details(
        &state.pool,
        video_id,
        &UpdateVideo {
            title: edit.title,
            description: edit.description,
        },
    )
    .await?
    .ok_or(video_not_found(video_id))?;

    tracing::info!(video_id, user_id = auth.user_id, "Video updated");

    Ok(Json(DataResponse { data: video }))
}

/// DELETE /api/v1/videos/{id}
pub async fn delete_video(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<StatusCode> {
    owned_video(&state, video_id, auth.user_id).await?;

    if !VideoRepo::delete(&state.pool, video_id).await? {
        return Err(video_not_found(video_id));
    }

    tracing::info!(video_id, user_id = auth.user_id, "Video deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn video_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Video", id })
}

/// Load a video and require that `user_id` uploaded it.
async fn owned_video(state: &AppState, video_id: DbId, user_id: DbId) -> AppResult<Video> {
    let video = VideoRepo::find_by_id(&state.pool, video_id)
        .await?
        .ok_or(video_not_found(video_id))?;

    if video.uploader_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader can change this video".into(),
        )));
    }
    Ok(video)
}
