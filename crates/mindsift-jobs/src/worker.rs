//! Polling worker consuming note-processing jobs from the queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use mindsift_core::defaults;
use mindsift_core::{Error, Job, JobKind, JobQueue, Result};
use mindsift_pipeline::NoteProcessor;

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Maximum number of concurrent jobs.
    pub max_concurrent_jobs: usize,
    /// Whether to enable job processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::JOB_POLL_INTERVAL_MS,
            max_concurrent_jobs: defaults::JOB_MAX_CONCURRENT,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JOB_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `JOB_MAX_CONCURRENT` | `4` | Max concurrent jobs |
    /// | `JOB_POLL_INTERVAL_MS` | `500` | Polling interval when queue is empty |
    pub fn from_env() -> Self {
        let enabled = std::env::var("JOB_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent_jobs = std::env::var("JOB_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::JOB_MAX_CONCURRENT)
            .max(1);

        let poll_interval_ms = std::env::var("JOB_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::JOB_POLL_INTERVAL_MS);

        Self {
            poll_interval_ms,
            max_concurrent_jobs,
            enabled,
        }
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set maximum concurrent jobs.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the job worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was started.
    JobStarted { job_id: Uuid },
    /// A job completed; the note reached a terminal status.
    JobCompleted { job_id: Uuid },
    /// A job delivery failed and was handed back to the queue.
    JobFailed { job_id: Uuid, error: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

const EVENT_BUS_CAPACITY: usize = 256;

/// Worker that claims processing jobs and drives the note processor.
pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    processor: Arc<NoteProcessor>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl JobWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        processor: Arc<NoteProcessor>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            queue,
            processor,
            config,
            event_tx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker loop and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Bundle the references a spawned job task needs.
    fn clone_refs(&self) -> JobWorkerRef {
        JobWorkerRef {
            queue: self.queue.clone(),
            processor: self.processor.clone(),
            event_tx: self.event_tx.clone(),
        }
    }

    /// Claim and process one batch of runnable jobs.
    ///
    /// Claims up to `max_concurrent_jobs`, runs them concurrently, waits
    /// for all of them, and returns how many were claimed. Exposed so the
    /// loop body is testable without the polling loop around it.
    pub async fn run_once(&self) -> usize {
        let mut tasks = tokio::task::JoinSet::new();
        let mut claimed = 0;

        for _ in 0..self.config.max_concurrent_jobs {
            match self.queue.claim_next(&[JobKind::Processing]).await {
                Ok(Some(job)) => {
                    claimed += 1;
                    let worker = self.clone_refs();
                    tasks.spawn(async move {
                        worker.execute_job(job).await;
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to claim job");
                    break;
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = ?e, "Job task panicked");
            }
        }

        claimed
    }

    /// Worker loop: process batches back-to-back, sleep only when idle.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Job worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            max_concurrent = self.config.max_concurrent_jobs,
            "Job worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Job worker received shutdown signal");
                break;
            }

            if self.run_once().await == 0 {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Job worker received shutdown signal");
                        break;
                    }
                    _ = sleep(poll_interval) => {}
                }
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Job worker stopped");
    }
}

/// Lightweight reference bundle for executing a single job in a spawned task.
struct JobWorkerRef {
    queue: Arc<dyn JobQueue>,
    processor: Arc<NoteProcessor>,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl JobWorkerRef {
    /// Execute a single claimed job.
    ///
    /// Delivery outcome mapping: a terminal note status means the delivery
    /// did its work, even when that status is `FAILED` — those complete.
    /// Only provider-call failures are handed back to the queue for
    /// backoff redelivery.
    async fn execute_job(self, job: Job) {
        let start = Instant::now();
        let job_id = job.id;

        let _ = self.event_tx.send(WorkerEvent::JobStarted { job_id });

        let payload = match job.processing_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Undecodable job payload");
                if let Err(e) = self.queue.fail(job_id, &e.to_string()).await {
                    error!(job_id = %job_id, error = %e, "Failed to mark job failed");
                }
                return;
            }
        };

        info!(job_id = %job_id, note_id = %payload.note_id, "Processing job");

        match self.processor.process(payload.note_id).await {
            Ok(_) => {
                self.finish(job_id, start).await;
            }
            Err(Error::ProviderCall(message)) => {
                if let Err(e) = self.queue.fail(job_id, &message).await {
                    error!(job_id = %job_id, error = %e, "Failed to mark job failed");
                }
                warn!(
                    job_id = %job_id,
                    %message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job handed back for redelivery"
                );
                let _ = self.event_tx.send(WorkerEvent::JobFailed {
                    job_id,
                    error: message,
                });
            }
            Err(err) => {
                // NotFound, AlreadyProcessing, and errors already recorded
                // as the note's terminal state: redelivery cannot help.
                debug!(job_id = %job_id, error = %err, "Job finished with recorded failure");
                self.finish(job_id, start).await;
            }
        }
    }

    async fn finish(&self, job_id: Uuid, start: Instant) {
        if let Err(e) = self.queue.complete(job_id).await {
            error!(job_id = %job_id, error = %e, "Failed to mark job completed");
            return;
        }
        info!(
            job_id = %job_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Job completed"
        );
        let _ = self.event_tx.send(WorkerEvent::JobCompleted { job_id });
    }
}
