//! Record finalizer.
//!
//! Turns an ingested file id plus user-supplied metadata into a persisted
//! video. Used by the direct-upload publish endpoint and by remote jobs once
//! they finish.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use vidfeed_core::error::CoreError;
use vidfeed_core::types::DbId;
use vidfeed_core::validation::PublishFields;
use vidfeed_db::models::video::{CreateVideo, Video};
use vidfeed_db::repositories::video_repo::UQ_EXTERNAL_FILE_ID;
use vidfeed_db::repositories::VideoRepo;
use vidfeed_ingest::ImageHost;

use crate::error::{is_unique_violation, AppError, AppResult};

/// Persists a finished upload as a video.
#[async_trait]
pub trait VideoPublisher: Send + Sync {
    async fn publish(
        &self,
        uploader_id: DbId,
        fields: PublishFields,
        thumbnail: Option<Vec<u8>>,
    ) -> AppResult<Video>;
}

/// Database-backed [`VideoPublisher`] with best-effort thumbnail hosting.
pub struct RecordFinalizer {
    pool: PgPool,
    image_host: Option<Arc<dyn ImageHost>>,
}

impl RecordFinalizer {
    /// `image_host` of `None` disables thumbnail uploads.
    pub fn new(pool: PgPool, image_host: Option<Arc<dyn ImageHost>>) -> Self {
        Self { pool, image_host }
    }

    /// Upload a thumbnail, returning its hosted URL.
    ///
    /// Never fails: any problem is logged and the video is published
    /// without a thumbnail.
    async fn host_thumbnail(&self, file_id: &str, image: Option<Vec<u8>>) -> Option<String> {
        let image = image.filter(|bytes| !bytes.is_empty())?;
        let Some(host) = &self.image_host else {
            tracing::warn!(file_id, "Thumbnail supplied but no image host is configured");
            return None;
        };

        match host.upload(&image).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(file_id, error = %e, "Thumbnail upload failed, publishing without it");
                None
            }
        }
    }
}

#[async_trait]
impl VideoPublisher for RecordFinalizer {
    async fn publish(
        &self,
        uploader_id: DbId,
        fields: PublishFields,
        thumbnail: Option<Vec<u8>>,
    ) -> AppResult<Video> {
        fields.check()?;

        // Checked up front so a duplicate never costs a thumbnail upload. The
        // unique constraint still decides races below.
        if VideoRepo::find_by_external_file_id(&self.pool, &fields.file_id)
            .await?
            .is_some()
        {
            return Err(duplicate(&fields.file_id));
        }

        let thumbnail_url = self.host_thumbnail(&fields.file_id, thumbnail).await;

        let input = CreateVideo {
            title: fields.title,
            description: fields.description,
            external_file_id: fields.file_id,
            thumbnail_url,
            uploader_id,
        };

        let video = VideoRepo::create(&self.pool, &input).await.map_err(|e| {
            if is_unique_violation(&e, UQ_EXTERNAL_FILE_ID) {
                duplicate(&input.external_file_id)
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(
            video_id = video.id,
            uploader_id,
            file_id = %video.external_file_id,
            has_thumbnail = video.thumbnail_url.is_some(),
            "Video published",
        );
        Ok(video)
    }
}

fn duplicate(file_id: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "A video with file id '{file_id}' has already been published"
    )))
}
