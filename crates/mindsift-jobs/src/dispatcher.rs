//! Job dispatch: decouples ingestion from processing.
//!
//! Ingestion (manual note creation or the external sync worker) enqueues
//! processing work here; workers consume it off the request path.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use mindsift_core::{JobKind, JobQueue, ProcessingJob, Result, SyncJob};

/// Enqueues work onto the durable queue.
pub struct JobDispatcher {
    queue: Arc<dyn JobQueue>,
}

impl JobDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Enqueue one note-processing job.
    pub async fn enqueue(&self, job: ProcessingJob) -> Result<Uuid> {
        let note_id = job.note_id;
        let job_id = self
            .queue
            .enqueue(JobKind::Processing, serde_json::to_value(&job)?)
            .await?;
        debug!(job_id = %job_id, note_id = %note_id, "Processing job dispatched");
        Ok(job_id)
    }

    /// Enqueue a batch of note-processing jobs, returning IDs in order.
    pub async fn enqueue_batch(&self, jobs: Vec<ProcessingJob>) -> Result<Vec<Uuid>> {
        let payloads = jobs
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ids = self.queue.enqueue_batch(JobKind::Processing, payloads).await?;
        debug!(count = ids.len(), "Processing job batch dispatched");
        Ok(ids)
    }

    /// Enqueue a job for the external note-sync worker. The payload is
    /// produced here and consumed entirely outside this system.
    pub async fn enqueue_sync(&self, job: SyncJob) -> Result<Uuid> {
        let job_id = self
            .queue
            .enqueue(JobKind::Sync, serde_json::to_value(&job)?)
            .await?;
        debug!(job_id = %job_id, user_id = %job.user_id, "Sync job dispatched");
        Ok(job_id)
    }
}
