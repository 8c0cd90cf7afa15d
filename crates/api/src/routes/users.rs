//! Route definitions for public user profiles.
//!
//! Mounted at `/users`.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{username}", get(users::profile))
}
