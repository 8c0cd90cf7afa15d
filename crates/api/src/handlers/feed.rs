//! Feed read handlers: the windowed feed, free-text search and single items.
//!
//! All three run the same query-time pipeline in [`FeedRepo`]; only the
//! base-row filter and the default ordering differ. Callers with a valid
//! bearer token get a personalised `is_liked`.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use vidfeed_core::error::CoreError;
use vidfeed_core::feed::{FeedFilter, FeedPage, PageRequest, SortMode};
use vidfeed_core::types::DbId;
use vidfeed_db::models::feed::FeedItem;
use vidfeed_db::repositories::FeedRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OptionalAuthUser;
use crate::query::{FeedParams, SearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/videos
///
/// Newest first unless `sort` says otherwise. `relevance` has nothing to
/// rank on here and degrades to newest first.
pub async fn list_feed(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> AppResult<impl IntoResponse> {
    let sort = SortMode::from_param(params.sort.as_deref(), SortMode::DateDesc);
    let page = load_page(&state, &FeedFilter::All, sort, params.window(), viewer.user_id()).await?;

    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/search
///
/// An empty or blank `q` returns an empty page without querying storage.
pub async fn search(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let window = params.window();
    let Some(filter) = params.q.as_deref().and_then(FeedFilter::text) else {
        return Ok(Json(DataResponse {
            data: FeedPage::<FeedItem>::empty(window),
        }));
    };

    let sort = SortMode::from_param(params.sort.as_deref(), SortMode::Relevance);
    let page = load_page(&state, &filter, sort, window, viewer.user_id()).await?;

    tracing::debug!(
        sort = sort.as_str(),
        total_items = page.total_items,
        "Search executed",
    );

    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/{id}
pub async fn get_video(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = FeedRepo::find_item(&state.pool, video_id, viewer.user_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    Ok(Json(DataResponse { data: item }))
}

/// Run the pipeline for one window and attach page metadata.
pub(crate) async fn load_page(
    state: &AppState,
    filter: &FeedFilter,
    sort: SortMode,
    window: PageRequest,
    viewer_id: Option<DbId>,
) -> AppResult<FeedPage<FeedItem>> {
    let items = FeedRepo::fetch_page(&state.pool, filter, sort, window, viewer_id).await?;
    let total = FeedRepo::count(&state.pool, filter).await?;

    Ok(FeedPage::new(items, window, total))
}
