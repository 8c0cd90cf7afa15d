//! Comment entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidfeed_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// A row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub video_id: DbId,
    pub author_id: DbId,
    pub text: String,
    pub created_at: Timestamp,
}

/// DTO for creating a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub video_id: DbId,
    pub author_id: DbId,
    pub text: String,
}

/// Comment joined with its author's public summary.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: DbId,
    pub video_id: DbId,
    pub author_id: DbId,
    pub text: String,
    pub created_at: Timestamp,
    pub author_ref_id: Option<DbId>,
    pub author_username: Option<String>,
}

/// API shape of a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    pub id: DbId,
    pub video_id: DbId,
    pub text: String,
    pub created_at: Timestamp,
    pub author: UserSummary,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            video_id: row.video_id,
            text: row.text,
            created_at: row.created_at,
            author: UserSummary {
                id: row.author_ref_id,
                username: row.author_username,
            },
        }
    }
}
