//! Catch-up processing of pending notes without queue delivery.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use mindsift_core::{defaults, NoteStore, Result};

use crate::processor::NoteProcessor;

/// Counts from one catch-up pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub errors: usize,
}

/// Drives the note processor over a bounded set of pending notes.
pub struct BatchRunner {
    notes: Arc<dyn NoteStore>,
    processor: Arc<NoteProcessor>,
}

impl BatchRunner {
    pub fn new(notes: Arc<dyn NoteStore>, processor: Arc<NoteProcessor>) -> Self {
        Self { notes, processor }
    }

    /// Process up to `limit` (default 10) oldest pending notes
    /// sequentially, optionally scoped to one user. Skipped notes count as
    /// processed; failures are recorded on the note and tallied here.
    #[instrument(skip(self))]
    pub async fn process_pending(
        &self,
        user_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<BatchReport> {
        let limit = limit.unwrap_or(defaults::BATCH_LIMIT);
        let pending = self.notes.list_pending(user_id, limit).await?;
        let mut report = BatchReport::default();

        for note in pending {
            match self.processor.process(note.id).await {
                Ok(_) => report.processed += 1,
                Err(_) => report.errors += 1,
            }
        }

        info!(
            processed = report.processed,
            errors = report.errors,
            "Batch pass finished"
        );
        Ok(report)
    }
}
