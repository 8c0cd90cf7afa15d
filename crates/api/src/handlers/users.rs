//! Public profile handler.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use vidfeed_core::error::CoreError;
use vidfeed_core::feed::{FeedFilter, FeedPage, SortMode};
use vidfeed_db::models::feed::FeedItem;
use vidfeed_db::models::user::User;
use vidfeed_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::feed::load_page;
use crate::middleware::auth::OptionalAuthUser;
use crate::query::FeedParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A user and one page of the videos they uploaded.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub videos: FeedPage<FeedItem>,
}

/// GET /api/v1/users/{username}
///
/// Videos default to newest first; `sort`, `page` and `limit` behave as on
/// the main feed.
pub async fn profile(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<FeedParams>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_username(&state.pool, username.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByKey {
                entity: "User",
                key: username.clone(),
            })
        })?;

    let sort = SortMode::from_param(params.sort.as_deref(), SortMode::DateDesc);
    let videos = load_page(
        &state,
        &FeedFilter::Uploader(user.id),
        sort,
        params.window(),
        viewer.user_id(),
    )
    .await?;

    Ok(Json(DataResponse {
        data: ProfileResponse { user, videos },
    }))
}
