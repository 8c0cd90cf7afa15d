//! User summary model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidfeed_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub created_at: Timestamp,
}

/// DTO for mirroring a user from the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

/// Public id + display name, as embedded in feed items and comments.
///
/// Both fields are `None` when the referenced user no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Option<DbId>,
    pub username: Option<String>,
}
