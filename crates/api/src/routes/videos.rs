//! Route definitions for the video feed, uploads and engagement.
//!
//! Mounted at `/videos`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{feed, uploads, videos};
use crate::state::AppState;

/// Largest accepted request body; bounds multipart thumbnails.
pub const MAX_UPLOAD_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::list_feed).post(uploads::publish))
        .route("/search", get(feed::search))
        .route("/upload-url", get(uploads::upload_url))
        .route("/remote-uploads", post(uploads::start_remote))
        .route(
            "/remote-uploads/{remote_id}",
            get(uploads::remote_status).delete(uploads::cancel_remote),
        )
        .route(
            "/{id}",
            get(feed::get_video)
                .put(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/{id}/view", post(videos::record_view))
        .route("/{id}/like", post(videos::toggle_like))
        .route(
            "/{id}/comments",
            get(videos::list_comments).post(videos::add_comment),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}
