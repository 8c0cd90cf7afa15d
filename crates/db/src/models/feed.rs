//! Feed projection: a video plus metrics derived at query time.

use serde::Serialize;
use sqlx::FromRow;
use vidfeed_core::types::{DbId, Timestamp};

use super::user::UserSummary;

/// Raw row produced by the feed pipeline.
#[derive(Debug, Clone, FromRow)]
pub struct FeedItemRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub external_file_id: String,
    pub thumbnail_url: Option<String>,
    pub uploader_id: DbId,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub likes_count: i64,
    pub comment_count: i64,
    pub is_liked: bool,
    pub relevance_score: Option<f32>,
    pub uploader_ref_id: Option<DbId>,
    pub uploader_username: Option<String>,
}

/// A feed entry as returned to clients. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub file_id: String,
    pub thumbnail_url: Option<String>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub likes_count: i64,
    pub comment_count: i64,
    /// Whether the requesting user is in the liker set (`false` if anonymous).
    pub is_liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
    pub uploader_id: DbId,
    pub uploader: UserSummary,
}

impl From<FeedItemRow> for FeedItem {
    fn from(row: FeedItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            file_id: row.external_file_id,
            thumbnail_url: row.thumbnail_url,
            view_count: row.view_count,
            created_at: row.created_at,
            likes_count: row.likes_count,
            comment_count: row.comment_count,
            is_liked: row.is_liked,
            relevance_score: row.relevance_score,
            uploader_id: row.uploader_id,
            uploader: UserSummary {
                id: row.uploader_ref_id,
                username: row.uploader_username,
            },
        }
    }
}
