//! Video entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vidfeed_core::types::{DbId, Timestamp};

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub external_file_id: String,
    pub thumbnail_url: Option<String>,
    pub uploader_id: DbId,
    pub view_count: i64,
    /// Raw liker set. Clients see `likes_count` / `is_liked` on feed items.
    #[serde(skip_serializing)]
    pub liker_ids: Option<Vec<DbId>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    pub fn likes_count(&self) -> i64 {
        self.liker_ids.as_ref().map_or(0, |ids| ids.len() as i64)
    }
}

/// DTO for persisting a finalized upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub title: String,
    pub description: String,
    pub external_file_id: String,
    pub thumbnail_url: Option<String>,
    pub uploader_id: DbId,
}

/// DTO for an owner edit. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Like state after a like mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct LikeState {
    pub likes: i64,
    pub is_liked: bool,
}
