//! Remote job supervision.
//!
//! Each accepted remote upload gets its own Tokio task that runs a
//! [`RemoteIngestion`] loop under an overall deadline and, once the job
//! finishes, hands the file id to the [`VideoPublisher`].
//!
//! The registry only holds handles: the owning user, a cancellation token
//! and a `watch` receiver with the latest [`RemoteJobSnapshot`]. The job
//! value itself lives inside the polling loop. Settled snapshots stay
//! readable for [`RemoteJobSettings::retention`] and are then dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use vidfeed_core::error::CoreError;
use vidfeed_core::ingestion::RemoteUploadJob;
use vidfeed_core::types::DbId;
use vidfeed_core::validation::{PublishFields, RemoteSubmission};
use vidfeed_ingest::{
    IngestError, IngestionBackend, JobObserver, JobOutcome, LoopControl, RemoteIngestion,
};

use crate::config::IngestConfig;
use crate::engine::finalizer::VideoPublisher;
use crate::error::AppResult;

/// How long a settled snapshot stays queryable.
pub const SETTLED_JOB_RETENTION: Duration = Duration::from_secs(600);

/// Supervision limits for remote jobs.
#[derive(Debug, Clone)]
pub struct RemoteJobSettings {
    pub poll_interval: Duration,
    pub job_timeout: Duration,
    pub max_poll_failures: u32,
    pub retention: Duration,
}

impl RemoteJobSettings {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            job_timeout: config.job_timeout(),
            max_poll_failures: config.max_poll_failures.max(1),
            retention: SETTLED_JOB_RETENTION,
        }
    }
}

/// Where a supervised job is in its life, beyond the collaborator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Polling,
    Publishing,
    Published,
    Failed,
    Cancelled,
    Abandoned,
    TimedOut,
}

impl JobPhase {
    /// No further changes will happen.
    pub fn is_settled(self) -> bool {
        !matches!(self, JobPhase::Polling | JobPhase::Publishing)
    }
}

/// Client-facing view of a supervised remote job.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteJobSnapshot {
    #[serde(flatten)]
    pub job: RemoteUploadJob,
    pub progress_percent: Option<u8>,
    pub phase: JobPhase,
    /// Set once the finished job has been published.
    pub video_id: Option<DbId>,
    /// Latest failure detail, if any.
    pub detail: Option<String>,
}

impl RemoteJobSnapshot {
    fn polling(job: RemoteUploadJob) -> Self {
        Self {
            progress_percent: job.progress_percent(),
            job,
            phase: JobPhase::Polling,
            video_id: None,
            detail: None,
        }
    }

    fn update(&mut self, job: &RemoteUploadJob) {
        self.job = job.clone();
        self.progress_percent = job.progress_percent();
    }

    fn settle(&mut self, phase: JobPhase, detail: Option<String>) {
        self.phase = phase;
        self.detail = detail;
    }
}

struct JobHandle {
    seq: u64,
    owner_id: DbId,
    cancel: CancellationToken,
    snapshot: watch::Receiver<RemoteJobSnapshot>,
}

/// Metadata held back until the remote job produces a file id.
struct PendingPublish {
    owner_id: DbId,
    title: String,
    description: String,
    thumbnail: Option<Vec<u8>>,
}

/// Pushes loop progress into the job's `watch` channel.
struct SnapshotObserver<'a> {
    tx: &'a watch::Sender<RemoteJobSnapshot>,
    max_poll_failures: u32,
}

impl JobObserver for SnapshotObserver<'_> {
    fn on_update(&mut self, job: &RemoteUploadJob) {
        self.tx.send_modify(|s| {
            s.update(job);
            s.detail = None;
        });
    }

    fn on_poll_failure(&mut self, error: &IngestError, consecutive: u32) -> LoopControl {
        self.tx.send_modify(|s| {
            s.detail = Some(format!("status check failed ({consecutive} in a row)"));
        });
        if consecutive >= self.max_poll_failures {
            tracing::warn!(error = %error, consecutive, "Abandoning remote job after repeated poll failures");
            LoopControl::Abandon
        } else {
            LoopControl::Continue
        }
    }
}

/// Owns every in-flight remote job of this process.
pub struct RemoteJobRegistry {
    backend: Arc<dyn IngestionBackend>,
    publisher: Arc<dyn VideoPublisher>,
    settings: RemoteJobSettings,
    jobs: RwLock<HashMap<String, JobHandle>>,
    next_seq: AtomicU64,
    shutdown: CancellationToken,
}

impl RemoteJobRegistry {
    pub fn new(
        backend: Arc<dyn IngestionBackend>,
        publisher: Arc<dyn VideoPublisher>,
        settings: RemoteJobSettings,
    ) -> Self {
        Self {
            backend,
            publisher,
            settings,
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Validate and submit a remote upload, then supervise it in the
    /// background. Returns the initial `queued` snapshot.
    pub async fn start(
        self: &Arc<Self>,
        owner_id: DbId,
        submission: RemoteSubmission,
        thumbnail: Option<Vec<u8>>,
    ) -> AppResult<RemoteJobSnapshot> {
        submission.check()?;

        let cancel = self.shutdown.child_token();
        let ingestion = RemoteIngestion::submit(
            Arc::clone(&self.backend),
            &submission.video_url,
            self.settings.poll_interval,
            cancel.clone(),
        )
        .await?;

        let remote_id = ingestion.remote_id().to_string();
        let initial = RemoteJobSnapshot::polling(ingestion.job().clone());
        let (tx, rx) = watch::channel(initial.clone());
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let previous = self.jobs.write().await.insert(
            remote_id.clone(),
            JobHandle {
                seq,
                owner_id,
                cancel,
                snapshot: rx,
            },
        );
        if let Some(previous) = previous {
            tracing::warn!(remote_id = %remote_id, "Remote id reused, cancelling the older job");
            previous.cancel.cancel();
        }

        tracing::info!(remote_id = %remote_id, owner_id, "Remote job started");

        let publish = PendingPublish {
            owner_id,
            title: submission.title,
            description: submission.description,
            thumbnail,
        };
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            registry.supervise(seq, ingestion, tx, publish).await;
        });

        Ok(initial)
    }

    /// Latest snapshot of `remote_id`, visible to its owner only.
    pub async fn snapshot(&self, remote_id: &str, requester: DbId) -> AppResult<RemoteJobSnapshot> {
        let jobs = self.jobs.read().await;
        let handle = owned_handle(&jobs, remote_id, requester)?;
        let snapshot = handle.snapshot.borrow().clone();
        Ok(snapshot)
    }

    /// Request cancellation. Takes effect at the next tick boundary.
    pub async fn cancel(&self, remote_id: &str, requester: DbId) -> AppResult<RemoteJobSnapshot> {
        let jobs = self.jobs.read().await;
        let handle = owned_handle(&jobs, remote_id, requester)?;
        handle.cancel.cancel();
        tracing::info!(remote_id, requester, "Remote job cancellation requested");
        let snapshot = handle.snapshot.borrow().clone();
        Ok(snapshot)
    }

    /// Watch a job's snapshots, regardless of owner.
    pub async fn subscribe(&self, remote_id: &str) -> Option<watch::Receiver<RemoteJobSnapshot>> {
        self.jobs
            .read()
            .await
            .get(remote_id)
            .map(|handle| handle.snapshot.clone())
    }

    /// Number of jobs that are still polling or publishing.
    pub async fn active_count(&self) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|handle| !handle.snapshot.borrow().phase.is_settled())
            .count()
    }

    /// Cancel every job. Used on graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // ---- private helpers ----

    async fn supervise(
        self: Arc<Self>,
        seq: u64,
        ingestion: RemoteIngestion,
        tx: watch::Sender<RemoteJobSnapshot>,
        publish: PendingPublish,
    ) {
        let remote_id = ingestion.remote_id().to_string();
        let mut observer = SnapshotObserver {
            tx: &tx,
            max_poll_failures: self.settings.max_poll_failures,
        };

        let outcome =
            tokio::time::timeout(self.settings.job_timeout, ingestion.run(&mut observer)).await;

        match outcome {
            Err(_) => {
                tracing::warn!(
                    remote_id = %remote_id,
                    timeout_secs = self.settings.job_timeout.as_secs(),
                    "Remote job timed out",
                );
                tx.send_modify(|s| {
                    s.settle(
                        JobPhase::TimedOut,
                        Some("remote upload did not finish in time".into()),
                    )
                });
            }
            Ok(JobOutcome::Finished(job)) => self.publish_finished(&tx, job, publish).await,
            Ok(JobOutcome::Failed(job)) => {
                tx.send_modify(|s| {
                    s.update(&job);
                    s.settle(JobPhase::Failed, job.error_message.clone());
                });
            }
            Ok(JobOutcome::Cancelled { .. }) => {
                tx.send_modify(|s| s.settle(JobPhase::Cancelled, None));
            }
            Ok(JobOutcome::Abandoned { last_error, .. }) => {
                tracing::warn!(remote_id = %remote_id, error = %last_error, "Remote job abandoned");
                tx.send_modify(|s| {
                    s.settle(
                        JobPhase::Abandoned,
                        Some("the video service stopped answering status checks".into()),
                    )
                });
            }
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = tokio::time::sleep(self.settings.retention) => {}
        }
        self.remove(&remote_id, seq).await;
    }

    async fn publish_finished(
        &self,
        tx: &watch::Sender<RemoteJobSnapshot>,
        job: RemoteUploadJob,
        publish: PendingPublish,
    ) {
        tx.send_modify(|s| {
            s.update(&job);
            s.phase = JobPhase::Publishing;
        });

        let Some(file_id) = job.result_file_id.as_deref() else {
            tx.send_modify(|s| s.settle(JobPhase::Failed, Some("no file id was reported".into())));
            return;
        };

        let fields = PublishFields::new(&publish.title, &publish.description, file_id);
        match self
            .publisher
            .publish(publish.owner_id, fields, publish.thumbnail)
            .await
        {
            Ok(video) => {
                tracing::info!(remote_id = %job.remote_id, video_id = video.id, "Remote job published");
                tx.send_modify(|s| {
                    s.video_id = Some(video.id);
                    s.settle(JobPhase::Published, None);
                });
            }
            Err(e) => {
                tracing::error!(remote_id = %job.remote_id, error = %e, "Failed to publish remote job");
                tx.send_modify(|s| s.settle(JobPhase::Failed, Some(e.public_message())));
            }
        }
    }

    async fn remove(&self, remote_id: &str, seq: u64) {
        let mut jobs = self.jobs.write().await;
        if jobs.get(remote_id).is_some_and(|handle| handle.seq == seq) {
            jobs.remove(remote_id);
        }
    }
}

fn owned_handle<'a>(
    jobs: &'a HashMap<String, JobHandle>,
    remote_id: &str,
    requester: DbId,
) -> AppResult<&'a JobHandle> {
    let handle = jobs.get(remote_id).ok_or_else(|| CoreError::NotFoundByKey {
        entity: "RemoteUpload",
        key: remote_id.to_string(),
    })?;
    if handle.owner_id != requester {
        return Err(CoreError::Forbidden("This remote upload belongs to another user".into()).into());
    }
    Ok(handle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
