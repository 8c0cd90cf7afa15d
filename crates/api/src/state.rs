use std::sync::Arc;

use vidfeed_ingest::{ImageHost, IngestionBackend};

use crate::config::ServerConfig;
use crate::engine::{RecordFinalizer, RemoteJobRegistry, RemoteJobSettings, VideoPublisher};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vidfeed_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Ingestion collaborator, used directly for the upload target.
    pub ingestion: Arc<dyn IngestionBackend>,
    /// Publishes finished uploads as videos.
    pub publisher: Arc<dyn VideoPublisher>,
    /// In-flight remote uploads.
    pub remote_jobs: Arc<RemoteJobRegistry>,
}

impl AppState {
    /// Wire the finalizer and the remote job registry around the given
    /// collaborators. `image_host` of `None` disables thumbnails.
    pub fn new(
        pool: vidfeed_db::DbPool,
        config: ServerConfig,
        ingestion: Arc<dyn IngestionBackend>,
        image_host: Option<Arc<dyn ImageHost>>,
    ) -> Self {
        let publisher: Arc<dyn VideoPublisher> =
            Arc::new(RecordFinalizer::new(pool.clone(), image_host));
        let remote_jobs = Arc::new(RemoteJobRegistry::new(
            Arc::clone(&ingestion),
            Arc::clone(&publisher),
            RemoteJobSettings::from_config(&config.ingest),
        ));

        Self {
            pool,
            config: Arc::new(config),
            ingestion,
            publisher,
            remote_jobs,
        }
    }
}
