//! Job queue implementation.
//!
//! A durable Postgres-backed queue with at-least-once delivery. Claiming
//! uses `FOR UPDATE SKIP LOCKED` so concurrent workers never double-claim;
//! failures re-queue with exponential backoff until the retry budget is
//! spent, then park the job as terminally failed.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use mindsift_core::defaults;
use mindsift_core::{Error, Job, JobKind, JobQueue, JobStatus, Result};

/// PostgreSQL implementation of [`JobQueue`].
pub struct PgJobQueue {
    pool: Pool<Postgres>,
}

impl PgJobQueue {
    /// Create a new queue with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: PgRow) -> Job {
        let kind: String = row.get("kind");
        let status: String = row.get("status");

        Job {
            id: row.get("id"),
            kind: JobKind::parse(&kind).unwrap_or(JobKind::Processing),
            payload: row.get("payload"),
            status: JobStatus::parse(&status).unwrap_or(JobStatus::Pending),
            attempt: row.get("attempt"),
            max_retries: row.get("max_retries"),
            error: row.get("error"),
            next_run_at: row.get("next_run_at"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }

    /// Delay before the next delivery of a job that has failed `attempt`
    /// times: 1s, 2s, 4s, ...
    fn backoff_after(attempt: i32) -> ChronoDuration {
        let exponent = attempt.saturating_sub(1).clamp(0, 16) as u32;
        ChronoDuration::milliseconds((defaults::JOB_BACKOFF_BASE_MS << exponent) as i64)
    }
}

const JOB_COLUMNS: &str = "id, kind, payload, status, attempt, max_retries, error, \
                           next_run_at, created_at, started_at, completed_at";

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, kind: JobKind, payload: JsonValue) -> Result<Uuid> {
        let job_id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO job_queue (id, kind, payload, status, max_retries, next_run_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(job_id)
        .bind(kind.as_str())
        .bind(&payload)
        .bind(JobStatus::Pending.as_str())
        .bind(defaults::JOB_MAX_RETRIES)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(job_id = %job_id, kind = kind.as_str(), "Job enqueued");
        Ok(job_id)
    }

    async fn enqueue_batch(&self, kind: JobKind, payloads: Vec<JsonValue>) -> Result<Vec<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(payloads.len());

        for payload in &payloads {
            let job_id = Uuid::now_v7();
            sqlx::query(
                "INSERT INTO job_queue (id, kind, payload, status, max_retries, next_run_at, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $6)",
            )
            .bind(job_id)
            .bind(kind.as_str())
            .bind(payload)
            .bind(JobStatus::Pending.as_str())
            .bind(defaults::JOB_MAX_RETRIES)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
            ids.push(job_id);
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(count = ids.len(), kind = kind.as_str(), "Job batch enqueued");
        Ok(ids)
    }

    async fn claim_next(&self, kinds: &[JobKind]) -> Result<Option<Job>> {
        let now = Utc::now();
        let kind_strings: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();

        let row = sqlx::query(&format!(
            "UPDATE job_queue
             SET status = $1, attempt = attempt + 1, started_at = $2
             WHERE id = (
                 SELECT id FROM job_queue
                 WHERE status = $3
                   AND next_run_at <= $2
                   AND (cardinality($4::text[]) = 0 OR kind = ANY($4))
                 ORDER BY next_run_at, created_at
                 FOR UPDATE SKIP LOCKED
                 LIMIT 1
             )
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(JobStatus::Running.as_str())
        .bind(now)
        .bind(JobStatus::Pending.as_str())
        .bind(&kind_strings)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE job_queue SET status = $2, completed_at = $3 WHERE id = $1")
            .bind(job_id)
            .bind(JobStatus::Completed.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (attempt, max_retries): (i32, i32) =
            sqlx::query_as("SELECT attempt, max_retries FROM job_queue WHERE id = $1")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if attempt < max_retries {
            // Attempts remain: back off and redeliver.
            let next_run_at = Utc::now() + Self::backoff_after(attempt);
            sqlx::query(
                "UPDATE job_queue
                 SET status = $2, error = $3, next_run_at = $4, started_at = NULL
                 WHERE id = $1",
            )
            .bind(job_id)
            .bind(JobStatus::Pending.as_str())
            .bind(error)
            .bind(next_run_at)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            debug!(job_id = %job_id, attempt, %error, "Job re-queued with backoff");
        } else {
            sqlx::query(
                "UPDATE job_queue SET status = $2, error = $3, completed_at = $4 WHERE id = $1",
            )
            .bind(job_id)
            .bind(JobStatus::Failed.as_str())
            .bind(error)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            warn!(job_id = %job_id, attempt, %error, "Job failed permanently");
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_queue WHERE status = $1")
            .bind(JobStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }
}
