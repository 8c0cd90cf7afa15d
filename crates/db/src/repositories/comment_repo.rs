//! Repository for the `comments` table.

use sqlx::PgPool;
use vidfeed_core::types::DbId;

use crate::models::comment::{CommentRow, CommentWithAuthor, CreateComment};

/// Comment columns plus the author's summary, selected from alias `c`
/// joined to `users u`.
const JOINED_COLUMNS: &str = "c.id, c.video_id, c.author_id, c.text, c.created_at, \
    u.id AS author_ref_id, u.username AS author_username";

/// Provides create and list operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment and return it with the author's summary.
    pub async fn create(
        pool: &PgPool,
        input: &CreateComment,
    ) -> Result<CommentWithAuthor, sqlx::Error> {
        let query = format!(
            "WITH c AS (
                INSERT INTO comments (video_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, video_id, author_id, text, created_at
             )
             SELECT {JOINED_COLUMNS}
             FROM c
             LEFT JOIN users u ON u.id = c.author_id"
        );
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(input.video_id)
            .bind(input.author_id)
            .bind(&input.text)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// All comments on a video, newest first.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM comments c
             LEFT JOIN users u ON u.id = c.author_id
             WHERE c.video_id = $1
             ORDER BY c.created_at DESC, c.id DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
