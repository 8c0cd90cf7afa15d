//! Repository for the `videos` table.
//!
//! Like mutations are single conditional `UPDATE` statements on the liker
//! array, so concurrent toggles never lose each other's writes: the row
//! lock serialises them and each one sees the other's result.

use sqlx::PgPool;
use vidfeed_core::types::DbId;

use crate::models::video::{CreateVideo, LikeState, UpdateVideo, Video};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, external_file_id, thumbnail_url, \
    uploader_id, view_count, liker_ids, created_at, updated_at";

/// `RETURNING` clause for like mutations.
const LIKE_STATE: &str = "COALESCE(cardinality(liker_ids), 0)::BIGINT AS likes, \
    COALESCE($2::BIGINT = ANY(liker_ids), FALSE) AS is_liked";

/// Name of the unique constraint guarding `external_file_id`.
pub const UQ_EXTERNAL_FILE_ID: &str = "uq_videos_external_file_id";

/// Provides CRUD, view and like operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new video. Fails with a unique violation on
    /// [`UQ_EXTERNAL_FILE_ID`] if the file id was already published.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (title, description, external_file_id, thumbnail_url, uploader_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.external_file_id)
            .bind(&input.thumbnail_url)
            .bind(input.uploader_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_external_file_id(
        pool: &PgPool,
        file_id: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE external_file_id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(file_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update title and/or description. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a video. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Atomically add one view. Returns `false` if the video does not exist.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Likes ────────────────────────────────────────────────────────

    /// Flip `user_id`'s membership in the liker set.
    ///
    /// Returns `None` if the video does not exist.
    pub async fn toggle_like(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET liker_ids = CASE
                WHEN $2::BIGINT = ANY(COALESCE(liker_ids, '{{}}'::BIGINT[]))
                    THEN array_remove(liker_ids, $2::BIGINT)
                ELSE array_append(COALESCE(liker_ids, '{{}}'::BIGINT[]), $2::BIGINT)
             END
             WHERE id = $1
             RETURNING {LIKE_STATE}"
        );
        sqlx::query_as::<_, LikeState>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Add `user_id` to the liker set if absent. Idempotent.
    pub async fn add_like(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET liker_ids = CASE
                WHEN $2::BIGINT = ANY(COALESCE(liker_ids, '{{}}'::BIGINT[])) THEN liker_ids
                ELSE array_append(COALESCE(liker_ids, '{{}}'::BIGINT[]), $2::BIGINT)
             END
             WHERE id = $1
             RETURNING {LIKE_STATE}"
        );
        sqlx::query_as::<_, LikeState>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Remove `user_id` from the liker set if present. Idempotent.
    pub async fn remove_like(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET liker_ids = array_remove(liker_ids, $2::BIGINT)
             WHERE id = $1
             RETURNING {LIKE_STATE}"
        );
        sqlx::query_as::<_, LikeState>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
