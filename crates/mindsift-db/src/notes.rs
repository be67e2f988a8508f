//! Note store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use mindsift_core::{
    AiDecision, Error, NewNote, Note, NoteOrigin, NoteStore, ProcessingStatus, Result,
};

/// PostgreSQL implementation of [`NoteStore`].
pub struct PgNoteStore {
    pool: Pool<Postgres>,
}

impl PgNoteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: PgRow) -> Note {
        let origin: String = row.get("origin");
        let status: String = row.get("status");
        let decision: Option<String> = row.get("ai_decision");

        Note {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            content: row.get("content"),
            origin: NoteOrigin::parse(&origin).unwrap_or(NoteOrigin::Manual),
            status: ProcessingStatus::parse(&status).unwrap_or(ProcessingStatus::Pending),
            ai_decision: decision.as_deref().and_then(AiDecision::parse),
            ai_response: row.get("ai_response"),
            processing_error: row.get("processing_error"),
            processed_at: row.get("processed_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

const NOTE_COLUMNS: &str = "id, user_id, title, content, origin, status, ai_decision, \
                            ai_response, processing_error, processed_at, created_at, updated_at";

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO note (id, user_id, title, content, origin, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.origin.as_str())
        .bind(ProcessingStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLUMNS} FROM note WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_row).ok_or(Error::NoteNotFound(id))
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<bool> {
        // Conditional update: exactly one of any concurrent claimers wins.
        let result = sqlx::query(
            "UPDATE note
             SET status = $2, processing_error = NULL, updated_at = $3
             WHERE id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(ProcessingStatus::Processing.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&self, id: Uuid, raw_response: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE note
             SET status = $2, ai_decision = $3, ai_response = $4,
                 processing_error = NULL, processed_at = $5, updated_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Completed.as_str())
        .bind(AiDecision::Extracted.as_str())
        .bind(raw_response)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_skipped(&self, id: Uuid, raw_response: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE note
             SET status = $2, ai_decision = $3, ai_response = $4,
                 processing_error = NULL, processed_at = $5, updated_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Skipped.as_str())
        .bind(AiDecision::Skipped.as_str())
        .bind(raw_response)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        decision: Option<AiDecision>,
        raw_response: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();
        // COALESCE keeps an earlier stored response when this failure has none.
        sqlx::query(
            "UPDATE note
             SET status = $2, ai_decision = $3, processing_error = $4,
                 ai_response = COALESCE($5, ai_response),
                 processed_at = $6, updated_at = $6
             WHERE id = $1",
        )
        .bind(id)
        .bind(ProcessingStatus::Failed.as_str())
        .bind(decision.map(|d| d.as_str()))
        .bind(error)
        .bind(raw_response)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_pending(&self, user_id: Option<Uuid>, limit: i64) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note
             WHERE status = $1 AND ($2::uuid IS NULL OR user_id = $2)
             ORDER BY created_at ASC
             LIMIT $3"
        ))
        .bind(ProcessingStatus::Pending.as_str())
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}
