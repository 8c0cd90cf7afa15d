//! Remote ingestion scheduler.
//!
//! [`RemoteIngestion`] owns one [`RemoteUploadJob`] from submission to a
//! terminal state. Polling is driven either one round trip at a time with
//! [`RemoteIngestion::tick`] or to completion with [`RemoteIngestion::run`].
//!
//! The scheduler keeps a single pending-tick slot. The slot is emptied while
//! a round trip is in flight and refilled only after it completes, so ticks
//! never overlap and there is at most one outstanding request per job.
//! Cancellation is checked at tick boundaries only; an in-flight request is
//! allowed to finish and its result is discarded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vidfeed_core::error::CoreError;
use vidfeed_core::ingestion::{RemoteJobStatus, RemoteUploadJob};
use vidfeed_core::validation::validate_source_url;

use crate::api::IngestionBackend;
use crate::error::IngestError;

/// Result of one scheduler step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still `queued` or `processing`; another tick is scheduled.
    Pending,
    Finished { file_id: String },
    Failed { message: String },
    Cancelled,
}

/// Whether the loop keeps polling after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Abandon,
}

/// Hooks the polling loop calls between ticks.
pub trait JobObserver: Send {
    /// Called after every status report was applied, including the
    /// terminal one.
    fn on_update(&mut self, _job: &RemoteUploadJob) {}

    /// Called after a failed round trip. `consecutive` counts failures since
    /// the last successful poll.
    fn on_poll_failure(&mut self, _error: &IngestError, _consecutive: u32) -> LoopControl {
        LoopControl::Continue
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// `result_file_id` is set and ready for finalization.
    Finished(RemoteUploadJob),
    /// `error_message` is set; nothing to finalize.
    Failed(RemoteUploadJob),
    /// Cancelled between ticks. Job state was discarded.
    Cancelled { remote_id: String },
    /// The observer gave up after transport failures.
    Abandoned { remote_id: String, last_error: String },
}

impl JobOutcome {
    pub fn remote_id(&self) -> &str {
        match self {
            JobOutcome::Finished(job) | JobOutcome::Failed(job) => &job.remote_id,
            JobOutcome::Cancelled { remote_id } | JobOutcome::Abandoned { remote_id, .. } => {
                remote_id
            }
        }
    }

    /// File id to hand to the record finalizer, if the job finished.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            JobOutcome::Finished(job) => job.result_file_id.as_deref(),
            _ => None,
        }
    }
}

/// Scheduler for a single remote ingestion job.
pub struct RemoteIngestion {
    job: RemoteUploadJob,
    backend: Arc<dyn IngestionBackend>,
    interval: Duration,
    cancel: CancellationToken,
    pending_tick: Option<Instant>,
}

impl std::fmt::Debug for RemoteIngestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteIngestion")
            .field("job", &self.job)
            .field("interval", &self.interval)
            .field("cancel", &self.cancel)
            .field("pending_tick", &self.pending_tick)
            .finish_non_exhaustive()
    }
}

impl RemoteIngestion {
    /// Validate `source_url`, submit it to the collaborator and return a
    /// scheduler for the queued job. The first poll is due one `interval`
    /// after submission.
    ///
    /// A rejected URL fails with [`IngestError::InvalidSource`] before any
    /// request is sent. A collaborator failure is returned as-is and is
    /// never retried.
    pub async fn submit(
        backend: Arc<dyn IngestionBackend>,
        source_url: &str,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, IngestError> {
        validate_source_url(source_url).map_err(|e| match e {
            CoreError::Validation(msg) => IngestError::InvalidSource(msg),
            other => IngestError::InvalidSource(other.to_string()),
        })?;
        let source_url = source_url.trim();

        let remote_id = backend.submit(source_url).await?;
        tracing::info!(remote_id = %remote_id, source_url, "Remote ingestion queued");

        let job = RemoteUploadJob::new(remote_id, source_url, Utc::now());
        Ok(Self {
            job,
            backend,
            interval,
            cancel,
            pending_tick: Some(Instant::now() + interval),
        })
    }

    pub fn job(&self) -> &RemoteUploadJob {
        &self.job
    }

    pub fn remote_id(&self) -> &str {
        &self.job.remote_id
    }

    /// A clone of the token that cancels this job.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// When the next tick is due, or `None` once polling has stopped.
    pub fn next_tick_at(&self) -> Option<Instant> {
        self.pending_tick
    }

    /// Cancel the job and clear the pending tick.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.pending_tick = None;
    }

    /// Perform one status round trip now, ignoring the due time.
    ///
    /// After a terminal state or cancellation this returns the final outcome
    /// without contacting the collaborator. A transport failure leaves the
    /// job unchanged, reschedules the next tick and is returned as `Err`.
    pub async fn tick(&mut self) -> Result<TickOutcome, IngestError> {
        if self.cancel.is_cancelled() {
            self.pending_tick = None;
            return Ok(TickOutcome::Cancelled);
        }
        if let Some(outcome) = self.terminal_outcome() {
            return Ok(outcome);
        }

        self.pending_tick = None;
        let report = match self.backend.poll(&self.job.remote_id).await {
            Ok(report) => report,
            Err(e) => {
                self.schedule_next();
                return Err(e);
            }
        };

        if self.cancel.is_cancelled() {
            return Ok(TickOutcome::Cancelled);
        }

        if let Err(e) = self.job.apply(report, Utc::now()) {
            tracing::warn!(remote_id = %self.job.remote_id, error = %e, "Status report ignored");
        }
        tracing::debug!(
            remote_id = %self.job.remote_id,
            status = %self.job.status,
            bytes_loaded = self.job.bytes_loaded,
            bytes_total = self.job.bytes_total,
            "Remote job polled",
        );

        match self.terminal_outcome() {
            Some(outcome) => Ok(outcome),
            None => {
                self.schedule_next();
                Ok(TickOutcome::Pending)
            }
        }
    }

    /// Poll at the configured interval until the job is terminal, cancelled
    /// or abandoned by `observer`.
    pub async fn run<O: JobObserver>(mut self, observer: &mut O) -> JobOutcome {
        let cancel = self.cancel.clone();
        let mut consecutive_failures = 0u32;

        loop {
            let Some(due) = self.pending_tick else {
                return self.into_outcome();
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(remote_id = %self.job.remote_id, "Remote job cancelled");
                    return JobOutcome::Cancelled { remote_id: self.job.remote_id };
                }
                _ = tokio::time::sleep_until(due) => {}
            }

            match self.tick().await {
                Ok(TickOutcome::Pending) => {
                    consecutive_failures = 0;
                    observer.on_update(&self.job);
                }
                Ok(TickOutcome::Cancelled) => {
                    tracing::info!(remote_id = %self.job.remote_id, "Remote job cancelled");
                    return JobOutcome::Cancelled { remote_id: self.job.remote_id };
                }
                Ok(TickOutcome::Finished { .. } | TickOutcome::Failed { .. }) => {
                    observer.on_update(&self.job);
                    tracing::info!(
                        remote_id = %self.job.remote_id,
                        status = %self.job.status,
                        "Remote job reached terminal state",
                    );
                    return self.into_outcome();
                }
                Err(error) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        remote_id = %self.job.remote_id,
                        error = %error,
                        consecutive_failures,
                        "Remote status poll failed",
                    );
                    if observer.on_poll_failure(&error, consecutive_failures) == LoopControl::Abandon {
                        return JobOutcome::Abandoned {
                            remote_id: self.job.remote_id,
                            last_error: error.to_string(),
                        };
                    }
                }
            }
        }
    }

    // ---- private helpers ----

    fn schedule_next(&mut self) {
        if !self.cancel.is_cancelled() {
            self.pending_tick = Some(Instant::now() + self.interval);
        }
    }

    fn terminal_outcome(&self) -> Option<TickOutcome> {
        match (&self.job.result_file_id, &self.job.error_message) {
            (Some(file_id), _) => Some(TickOutcome::Finished {
                file_id: file_id.clone(),
            }),
            (None, Some(message)) => Some(TickOutcome::Failed {
                message: message.clone(),
            }),
            (None, None) => None,
        }
    }

    fn into_outcome(self) -> JobOutcome {
        match self.job.status {
            RemoteJobStatus::Finished => JobOutcome::Finished(self.job),
            RemoteJobStatus::Error => JobOutcome::Failed(self.job),
            RemoteJobStatus::Queued | RemoteJobStatus::Processing => JobOutcome::Cancelled {
                remote_id: self.job.remote_id,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
