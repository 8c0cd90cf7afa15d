//! Upload orchestration: record finalization and remote job supervision.

pub mod finalizer;
pub mod remote_jobs;

pub use finalizer::{RecordFinalizer, VideoPublisher};
pub use remote_jobs::{JobPhase, RemoteJobRegistry, RemoteJobSettings, RemoteJobSnapshot};
