//! External collaborators for video ingestion and the remote polling loop.
//!
//! - [`api`]: HTTP client for the ingestion service (upload targets,
//!   remote URL submission, status polling).
//! - [`imagehost`]: thumbnail upload to an image-hosting service.
//! - [`poller`]: the [`RemoteIngestion`](poller::RemoteIngestion) scheduler
//!   that drives one remote job to a terminal state.

pub mod api;
pub mod error;
pub mod imagehost;
pub mod poller;

pub use api::{AuraHubClient, IngestionBackend};
pub use error::IngestError;
pub use imagehost::{ImageHost, ImgbbClient};
pub use poller::{JobObserver, JobOutcome, LoopControl, RemoteIngestion, TickOutcome};
