//! Remote upload job lifecycle.
//!
//! A [`RemoteUploadJob`] is an in-memory value owned by whoever drives the
//! polling loop. It is never persisted; it changes state only when a
//! [`StatusReport`] from the ingestion collaborator is applied to it, and it
//! stops accepting reports once it reaches `finished` or `error`.
//!
//! ```text
//! queued -> processing -> finished
//!                      \-> error
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Lifecycle state of a remote upload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteJobStatus {
    Queued,
    Processing,
    Finished,
    Error,
}

impl RemoteJobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteJobStatus::Queued => "queued",
            RemoteJobStatus::Processing => "processing",
            RemoteJobStatus::Finished => "finished",
            RemoteJobStatus::Error => "error",
        }
    }

    /// `finished` and `error` end polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteJobStatus::Finished | RemoteJobStatus::Error)
    }
}

impl std::fmt::Display for RemoteJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory transfer progress. Either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub bytes_loaded: Option<u64>,
    pub bytes_total: Option<u64>,
}

/// A normalized status response from the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    Queued(Progress),
    Processing(Progress),
    Finished { file_id: String },
    Error { message: String },
}

impl StatusReport {
    pub fn status(&self) -> RemoteJobStatus {
        match self {
            StatusReport::Queued(_) => RemoteJobStatus::Queued,
            StatusReport::Processing(_) => RemoteJobStatus::Processing,
            StatusReport::Finished { .. } => RemoteJobStatus::Finished,
            StatusReport::Error { .. } => RemoteJobStatus::Error,
        }
    }
}

/// Rejected attempt to move a job that has already finished or failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote job {remote_id} is already {status}")]
pub struct TransitionError {
    pub remote_id: String,
    pub status: RemoteJobStatus,
}

/// Client-side view of one remote ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteUploadJob {
    pub remote_id: String,
    pub source_url: String,
    pub status: RemoteJobStatus,
    pub bytes_loaded: Option<u64>,
    pub bytes_total: Option<u64>,
    /// Set only when `status == Finished`.
    pub result_file_id: Option<String>,
    /// Set only when `status == Error`.
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub last_polled_at: Option<Timestamp>,
}

impl RemoteUploadJob {
    /// A freshly submitted job, `queued` until the first poll says otherwise.
    pub fn new(remote_id: impl Into<String>, source_url: impl Into<String>, now: Timestamp) -> Self {
        Self {
            remote_id: remote_id.into(),
            source_url: source_url.into(),
            status: RemoteJobStatus::Queued,
            bytes_loaded: None,
            bytes_total: None,
            result_file_id: None,
            error_message: None,
            created_at: now,
            last_polled_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply one poll response observed at `polled_at`.
    ///
    /// Non-terminal reports may move the job between `queued` and
    /// `processing` freely; the collaborator is the only authority on state.
    pub fn apply(&mut self, report: StatusReport, polled_at: Timestamp) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                remote_id: self.remote_id.clone(),
                status: self.status,
            });
        }

        self.last_polled_at = Some(polled_at);
        self.status = report.status();

        match report {
            StatusReport::Queued(progress) | StatusReport::Processing(progress) => {
                // Keep the last known figures when a report omits them.
                if progress.bytes_loaded.is_some() {
                    self.bytes_loaded = progress.bytes_loaded;
                }
                if progress.bytes_total.is_some() {
                    self.bytes_total = progress.bytes_total;
                }
            }
            StatusReport::Finished { file_id } => {
                self.result_file_id = Some(file_id);
            }
            StatusReport::Error { message } => {
                self.error_message = Some(message);
            }
        }
        Ok(())
    }

    /// Whole-number completion percentage, when both byte counts are known.
    pub fn progress_percent(&self) -> Option<u8> {
        match (self.bytes_loaded, self.bytes_total) {
            (Some(loaded), Some(total)) if total > 0 => {
                // Widened so collaborator-reported sizes near u64::MAX cannot overflow.
                let percent = u128::from(loaded.min(total)) * 100 / u128::from(total);
                Some(percent as u8)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
