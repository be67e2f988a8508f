//! Store traits for mindsift abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable storage backends and testability. The
//! pipeline only ever talks to these traits; the relational store behind
//! them is an external collaborator.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE STORE
// =============================================================================

/// Repository for note rows and their processing-state transitions.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note in `PENDING` status.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// Fetch a note by ID. Fails with [`crate::Error::NoteNotFound`] if absent.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Conditionally move a note into `PROCESSING`.
    ///
    /// The update applies only when the current status is not already
    /// `PROCESSING`; returns whether it applied. This is the guard that
    /// turns a reprocess racing a queued job into exactly one winner.
    async fn claim_for_processing(&self, id: Uuid) -> Result<bool>;

    /// Terminal write: `COMPLETED` with decision `EXTRACTED`, raw response,
    /// cleared error, and a processed timestamp.
    async fn mark_completed(&self, id: Uuid, raw_response: &str) -> Result<()>;

    /// Terminal write: `SKIPPED` with decision `SKIPPED` and raw response.
    async fn mark_skipped(&self, id: Uuid, raw_response: &str) -> Result<()>;

    /// Terminal write: `FAILED` with the error message, an optional
    /// decision, and the raw response where one exists.
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        decision: Option<AiDecision>,
        raw_response: Option<&str>,
    ) -> Result<()>;

    /// Oldest-first `PENDING` notes, optionally scoped to one user.
    async fn list_pending(&self, user_id: Option<Uuid>, limit: i64) -> Result<Vec<Note>>;
}

// =============================================================================
// IDEA STORE
// =============================================================================

/// Repository for extracted ideas.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Insert a new idea with workflow status `NEW`.
    async fn insert(&self, idea: NewIdea) -> Result<Idea>;

    /// All ideas derived from a note, oldest first.
    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Idea>>;
}

// =============================================================================
// TAG STORE
// =============================================================================

/// Repository for the globally shared tag table.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Look up a tag by exact name, creating it if absent.
    ///
    /// Must be safe under concurrent calls with the same name: at most one
    /// tag row per distinct name ever exists.
    async fn upsert(&self, name: &str) -> Result<Tag>;

    /// Link a tag to an idea. Linking the same pair twice is a no-op.
    async fn attach_to_idea(&self, idea_id: Uuid, tag_id: Uuid) -> Result<()>;

    /// Tags linked to an idea, by name.
    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// SETTINGS STORE
// =============================================================================

/// Repository for per-user AI settings and encrypted provider keys.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch a user's settings, falling back to defaults when the user has
    /// never configured anything.
    async fn fetch(&self, user_id: Uuid) -> Result<AiSettings>;

    /// Persist the full settings row.
    async fn update(&self, settings: &AiSettings) -> Result<()>;

    /// Store an encrypted API key for a provider and enable AI.
    async fn store_api_key(
        &self,
        user_id: Uuid,
        provider: AiProvider,
        key: EncryptedSecret,
    ) -> Result<()>;

    /// Remove a provider's key, failing the active selection over to the
    /// other provider when it has a key, or disabling AI when neither does.
    async fn remove_api_key(&self, user_id: Uuid, provider: AiProvider) -> Result<()>;
}

// =============================================================================
// COMPLETION BACKEND
// =============================================================================

/// Options for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: crate::defaults::TEMPERATURE,
            max_tokens: crate::defaults::MAX_TOKENS,
        }
    }
}

/// A text-completion capability over one LLM vendor.
///
/// Vendor selection happens in a resolution function that hands back a
/// trait object; call sites never branch on the provider.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a completion and return the raw model text.
    ///
    /// Network, auth, rate-limit, and timeout failures all surface as
    /// [`crate::Error::ProviderCall`].
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Which vendor this backend talks to.
    fn provider(&self) -> AiProvider;

    /// The model the backend is configured for.
    fn model_name(&self) -> &str;
}

// =============================================================================
// JOB QUEUE
// =============================================================================

/// Durable queue with at-least-once delivery and bounded automatic retry.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a single job, returning its ID.
    async fn enqueue(&self, kind: JobKind, payload: serde_json::Value) -> Result<Uuid>;

    /// Enqueue a batch of jobs of one kind, returning IDs in order.
    async fn enqueue_batch(
        &self,
        kind: JobKind,
        payloads: Vec<serde_json::Value>,
    ) -> Result<Vec<Uuid>>;

    /// Claim the next runnable job of the given kinds, marking it running.
    /// Jobs in their backoff window are not returned.
    async fn claim_next(&self, kinds: &[JobKind]) -> Result<Option<Job>>;

    /// Mark a claimed job completed.
    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Record a delivery failure. Re-queues with exponential backoff while
    /// attempts remain, otherwise marks the job terminally failed.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Number of jobs currently waiting for delivery.
    async fn pending_count(&self) -> Result<i64>;
}
