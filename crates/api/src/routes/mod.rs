pub mod health;
pub mod users;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                                    feed (GET), publish direct upload (POST)
/// /videos/search                             free-text feed
/// /videos/upload-url                         direct-upload target
/// /videos/remote-uploads                     start remote ingestion
/// /videos/remote-uploads/{remote_id}         job snapshot (GET), cancel (DELETE)
/// /videos/{id}                               get, edit (PUT), delete
/// /videos/{id}/view                          count a view
/// /videos/{id}/like                          toggle like
/// /videos/{id}/comments                      list, add
///
/// /users/{username}                          profile with uploaded videos
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .nest("/users", users::router())
}
