//! The note processor: one note's journey from raw text to terminal state.
//!
//! `process` drives the state machine
//! `PENDING → PROCESSING → {COMPLETED, FAILED, SKIPPED}`. Every failure
//! path after the `PROCESSING` write lands in a terminal status before the
//! function returns, so a note is never left stuck in `PROCESSING`.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use mindsift_core::defaults;
use mindsift_core::{
    AiDecision, CompletionOptions, Error, Idea, IdeaStore, NewIdea, Note, NoteStore, Result,
    SettingsStore, TagStore,
};
use mindsift_inference::ProviderResolver;

use crate::parser::{parse_extraction, Extraction};
use crate::prompt::{render_prompt, DEFAULT_PROCESSING_PROMPT};

/// Successful outcome of processing one note.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// An idea was extracted; the note is `COMPLETED`.
    Completed { idea: Idea },
    /// The model judged the note uninteresting; the note is `SKIPPED`.
    Skipped,
}

/// Orchestrates the extraction lifecycle for single notes.
pub struct NoteProcessor {
    notes: Arc<dyn NoteStore>,
    ideas: Arc<dyn IdeaStore>,
    tags: Arc<dyn TagStore>,
    settings: Arc<dyn SettingsStore>,
    clients: Arc<dyn ProviderResolver>,
}

impl NoteProcessor {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        ideas: Arc<dyn IdeaStore>,
        tags: Arc<dyn TagStore>,
        settings: Arc<dyn SettingsStore>,
        clients: Arc<dyn ProviderResolver>,
    ) -> Self {
        Self {
            notes,
            ideas,
            tags,
            settings,
            clients,
        }
    }

    /// Process one note to a terminal status.
    ///
    /// Returns the outcome, or the failure that was recorded on the note.
    /// [`Error::NoteNotFound`] and [`Error::AlreadyProcessing`] are the
    /// only errors that leave the note untouched: the first because there
    /// is nothing to touch, the second because a concurrent invocation
    /// owns the terminal write.
    #[instrument(skip(self), fields(note_id = %note_id))]
    pub async fn process(&self, note_id: Uuid) -> Result<ProcessOutcome> {
        let note = self.notes.fetch(note_id).await?;

        if !self.notes.claim_for_processing(note_id).await? {
            warn!(note_id = %note_id, "Concurrent processing detected, yielding");
            return Err(Error::AlreadyProcessing(note_id));
        }

        match self.run(&note).await {
            Ok(outcome) => {
                let label = match &outcome {
                    ProcessOutcome::Completed { .. } => "completed",
                    ProcessOutcome::Skipped => "skipped",
                };
                info!(note_id = %note_id, outcome = label, "Note processed");
                Ok(outcome)
            }
            Err(err) => {
                // The parse-failure path already wrote its terminal state
                // (it alone retains the raw response for diagnosis).
                if !matches!(err, Error::UnparsableResponse) {
                    if let Err(write_err) = self
                        .notes
                        .mark_failed(note_id, &err.to_string(), Some(AiDecision::Error), None)
                        .await
                    {
                        error!(
                            note_id = %note_id,
                            error = %write_err,
                            "Failed to record terminal failure"
                        );
                    }
                }
                warn!(note_id = %note_id, error = %err, "Note processing failed");
                Err(err)
            }
        }
    }

    /// Steps 3-9: resolve, render, call, parse, commit.
    async fn run(&self, note: &Note) -> Result<ProcessOutcome> {
        let settings = self.settings.fetch(note.user_id).await?;
        let backend = self.clients.resolve(&settings)?;

        let template = settings
            .custom_prompt
            .as_deref()
            .unwrap_or(DEFAULT_PROCESSING_PROMPT);
        let prompt = render_prompt(template, note.title.as_deref(), &note.content)?;

        let options = CompletionOptions {
            temperature: settings.temperature,
            max_tokens: defaults::MAX_TOKENS,
        };
        let raw = backend.complete(&prompt, &options).await?;

        let extraction = match parse_extraction(&raw) {
            Ok(extraction) => extraction,
            Err(err) => {
                self.notes
                    .mark_failed(note.id, "Failed to parse AI response", None, Some(&raw))
                    .await?;
                return Err(err);
            }
        };

        match extraction {
            Extraction::Skip => {
                self.notes.mark_skipped(note.id, &raw).await?;
                Ok(ProcessOutcome::Skipped)
            }
            Extraction::Extracted(fields) => {
                let idea = self
                    .ideas
                    .insert(NewIdea {
                        user_id: note.user_id,
                        note_id: Some(note.id),
                        title: fields.title,
                        description: fields.description,
                        category: fields.category,
                        potential: fields.potential,
                        kind: fields.kind,
                        next_steps: fields.next_steps,
                    })
                    .await?;

                for tag_name in &fields.tags {
                    let tag = self.tags.upsert(tag_name).await?;
                    self.tags.attach_to_idea(idea.id, tag.id).await?;
                }

                self.notes.mark_completed(note.id, &raw).await?;
                Ok(ProcessOutcome::Completed { idea })
            }
        }
    }
}
